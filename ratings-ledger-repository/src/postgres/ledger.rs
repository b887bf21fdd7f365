use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ratings_ledger_shared::types::{
    Activity, Comment, EntityId, EntityType, UserId, VotableRef, Vote, VoteType, VotesCount,
    VotesDelta,
};
use sqlx::Postgres;

use super::rows::{VotableRow, VoteRow};
use super::{PostgresRatingsRepository, entity_table, vote_table};
use crate::{LedgerRepository, LedgerTransaction, RepositoryError};

/// A ledger unit of work backed by one PostgreSQL transaction.
///
/// Dropping it without calling `commit` rolls the transaction back.
pub struct PostgresLedgerTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerRepository for PostgresRatingsRepository {
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>, RepositoryError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PostgresLedgerTransaction { tx }))
    }
}

#[async_trait]
impl LedgerTransaction for PostgresLedgerTransaction {
    async fn lock_votable(
        &mut self,
        entity_type: EntityType,
        entity_id: EntityId,
    ) -> Result<Option<VotableRef>, RepositoryError> {
        // A comment is gone if either it or its rating was soft-deleted.
        let sql = match entity_type {
            EntityType::Rating => {
                r#"
                SELECT user_id, id AS rating_id, deleted_at IS NOT NULL AS deleted
                FROM ratings
                WHERE id = $1
                FOR UPDATE
                "#
            }
            EntityType::Comment => {
                r#"
                SELECT c.user_id, c.rating_id,
                       (c.deleted_at IS NOT NULL OR r.deleted_at IS NOT NULL) AS deleted
                FROM comments c
                JOIN ratings r ON r.id = c.rating_id
                WHERE c.id = $1
                FOR UPDATE OF c
                "#
            }
        };

        let row = sqlx::query_as::<_, VotableRow>(sql)
            .bind(entity_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(row.map(|row| VotableRef {
            entity_id,
            entity_type,
            owner_id: row.user_id,
            rating_id: row.rating_id,
            deleted: row.deleted,
        }))
    }

    async fn find_vote(
        &mut self,
        entity_type: EntityType,
        entity_id: EntityId,
        user_id: UserId,
    ) -> Result<Option<Vote>, RepositoryError> {
        let sql = format!(
            "SELECT entity_id, user_id, vote_type, created_at FROM {} WHERE entity_id = $1 AND user_id = $2",
            vote_table(entity_type)
        );
        let row = sqlx::query_as::<_, VoteRow>(&sql)
            .bind(entity_id)
            .bind(user_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        row.map(|row| row.into_vote(entity_type)).transpose()
    }

    async fn insert_vote(&mut self, vote: &Vote) -> Result<(), RepositoryError> {
        let sql = format!(
            "INSERT INTO {} (entity_id, user_id, vote_type, created_at) VALUES ($1, $2, $3, $4)",
            vote_table(vote.entity_type)
        );
        sqlx::query(&sql)
            .bind(vote.entity_id)
            .bind(vote.user_id)
            .bind(i16::from(vote.vote_type))
            .bind(vote.created_at)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn update_vote_type(
        &mut self,
        entity_type: EntityType,
        entity_id: EntityId,
        user_id: UserId,
        vote_type: VoteType,
        voted_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let sql = format!(
            "UPDATE {} SET vote_type = $3, created_at = $4 WHERE entity_id = $1 AND user_id = $2",
            vote_table(entity_type)
        );
        sqlx::query(&sql)
            .bind(entity_id)
            .bind(user_id)
            .bind(i16::from(vote_type))
            .bind(voted_at)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn delete_vote(
        &mut self,
        entity_type: EntityType,
        entity_id: EntityId,
        user_id: UserId,
    ) -> Result<(), RepositoryError> {
        let sql = format!(
            "DELETE FROM {} WHERE entity_id = $1 AND user_id = $2",
            vote_table(entity_type)
        );
        sqlx::query(&sql)
            .bind(entity_id)
            .bind(user_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn apply_votes_delta(
        &mut self,
        entity_type: EntityType,
        entity_id: EntityId,
        delta: VotesDelta,
    ) -> Result<VotesCount, RepositoryError> {
        let sql = format!(
            r#"
            UPDATE {}
            SET upvotes_count = GREATEST(upvotes_count + $2, 0),
                downvotes_count = GREATEST(downvotes_count + $3, 0)
            WHERE id = $1
            RETURNING upvotes_count, downvotes_count
            "#,
            entity_table(entity_type)
        );
        let counts: Option<(i64, i64)> = sqlx::query_as(&sql)
            .bind(entity_id)
            .bind(delta.upvotes)
            .bind(delta.downvotes)
            .fetch_optional(&mut *self.tx)
            .await?;

        let (upvotes, downvotes) = counts.ok_or_else(|| {
            RepositoryError::MissingRow(format!("{} {}", entity_type.as_str(), entity_id))
        })?;
        Ok(VotesCount {
            entity_id,
            entity_type,
            upvotes,
            downvotes,
        })
    }

    async fn insert_activity(&mut self, activity: &Activity) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO activities (
                id, recipient_user_id, actor_user_id, activity_type, entity_id, entity_type,
                metadata, is_read, read_at, created_at, deleted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(activity.id)
        .bind(activity.recipient_user_id)
        .bind(activity.actor_user_id)
        .bind(i16::from(activity.activity_type))
        .bind(activity.entity_id)
        .bind(i16::from(activity.entity_type))
        .bind(&activity.metadata)
        .bind(activity.is_read)
        .bind(activity.read_at)
        .bind(activity.created_at)
        .bind(activity.deleted_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn soft_delete_activities_for_entity(
        &mut self,
        entity_type: EntityType,
        entity_id: EntityId,
        deleted_at: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE activities
            SET deleted_at = $3
            WHERE entity_type = $1 AND entity_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(i16::from(entity_type))
        .bind(entity_id)
        .bind(deleted_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected())
    }

    async fn insert_comment(&mut self, comment: &Comment) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO comments (
                id, rating_id, user_id, body, upvotes_count, downvotes_count, created_at, deleted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(comment.id)
        .bind(comment.rating_id)
        .bind(comment.user_id)
        .bind(&comment.body)
        .bind(comment.upvotes_count)
        .bind(comment.downvotes_count)
        .bind(comment.created_at)
        .bind(comment.deleted_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn soft_delete_comment(
        &mut self,
        comment_id: EntityId,
        deleted_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("UPDATE comments SET deleted_at = $2 WHERE id = $1 AND deleted_at IS NULL")
                .bind(comment_id)
                .bind(deleted_at)
                .execute(&mut *self.tx)
                .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn adjust_comments_count(
        &mut self,
        rating_id: EntityId,
        delta: i64,
    ) -> Result<i64, RepositoryError> {
        let count: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE ratings
            SET comments_count = GREATEST(comments_count + $2, 0)
            WHERE id = $1
            RETURNING comments_count
            "#,
        )
        .bind(rating_id)
        .bind(delta)
        .fetch_optional(&mut *self.tx)
        .await?;

        count.ok_or_else(|| RepositoryError::MissingRow(format!("rating {}", rating_id)))
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), RepositoryError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
