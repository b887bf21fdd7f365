use async_trait::async_trait;
use ratings_ledger_shared::PageRequest;
use ratings_ledger_shared::types::{Comment, EntityId, EntityType, Rating, UserId, Vote};
use sqlx::{Postgres, QueryBuilder};

use super::rows::{CommentRow, RatingRow, VoteRow};
use super::{PostgresRatingsRepository, push_page_filter, vote_table};
use crate::{ContentRepository, RepositoryError};

const RATING_COLUMNS: &str = "id, user_id, title, score, body, tags, upvotes_count, downvotes_count, comments_count, created_at, deleted_at";
const COMMENT_COLUMNS: &str =
    "id, rating_id, user_id, body, upvotes_count, downvotes_count, created_at, deleted_at";

#[async_trait]
impl ContentRepository for PostgresRatingsRepository {
    async fn insert_rating(&self, rating: &Rating) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO ratings (
                id, user_id, title, score, body, tags, upvotes_count, downvotes_count,
                comments_count, created_at, deleted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(rating.id)
        .bind(rating.user_id)
        .bind(&rating.title)
        .bind(rating.score)
        .bind(&rating.body)
        .bind(&rating.tags)
        .bind(rating.upvotes_count)
        .bind(rating.downvotes_count)
        .bind(rating.comments_count)
        .bind(rating.created_at)
        .bind(rating.deleted_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_rating(&self, rating_id: EntityId) -> Result<Option<Rating>, RepositoryError> {
        let sql = format!("SELECT {RATING_COLUMNS} FROM ratings WHERE id = $1");
        let row = sqlx::query_as::<_, RatingRow>(&sql)
            .bind(rating_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Rating::from))
    }

    async fn get_comment(&self, comment_id: EntityId) -> Result<Option<Comment>, RepositoryError> {
        let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1");
        let row = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(comment_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Comment::from))
    }

    async fn list_feed(
        &self,
        request: &PageRequest,
        tag: Option<&str>,
    ) -> Result<Vec<Rating>, RepositoryError> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {RATING_COLUMNS} FROM ratings WHERE deleted_at IS NULL"
        ));
        if let Some(tag) = tag {
            builder.push(" AND ").push_bind(tag.to_string()).push(" = ANY(tags)");
        }
        push_page_filter(&mut builder, &request.filter, "created_at", "id");
        builder
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(request.fetch_limit() as i64);

        let rows = builder
            .build_query_as::<RatingRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Rating::from).collect())
    }

    async fn list_comments(
        &self,
        rating_id: EntityId,
        request: &PageRequest,
    ) -> Result<Vec<Comment>, RepositoryError> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE deleted_at IS NULL AND rating_id = "
        ));
        builder.push_bind(rating_id);
        push_page_filter(&mut builder, &request.filter, "created_at", "id");
        builder
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(request.fetch_limit() as i64);

        let rows = builder
            .build_query_as::<CommentRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Comment::from).collect())
    }

    async fn get_vote(
        &self,
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
            .fetch_optional(&self.pool)
            .await?;
        row.map(|row| row.into_vote(entity_type)).transpose()
    }
}
