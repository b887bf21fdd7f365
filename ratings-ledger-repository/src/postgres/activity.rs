use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ratings_ledger_shared::PageRequest;
use ratings_ledger_shared::types::{ActivityId, ActivityView, EntityType, UserId};
use sqlx::{Postgres, QueryBuilder};

use super::rows::ActivityRow;
use super::{PostgresRatingsRepository, push_page_filter};
use crate::{ActivityRepository, RepositoryError};

#[async_trait]
impl ActivityRepository for PostgresRatingsRepository {
    /// Lists a recipient's live activities, newest first.
    ///
    /// Comment activities are joined to their comment so the parent rating can
    /// be returned as the deep-link target in the same round trip.
    async fn list_activities(
        &self,
        recipient_id: UserId,
        request: &PageRequest,
    ) -> Result<Vec<ActivityView>, RepositoryError> {
        let mut builder = QueryBuilder::<Postgres>::new(
            r#"
            SELECT a.id, a.recipient_user_id, a.actor_user_id, a.activity_type, a.entity_id,
                   a.entity_type, a.metadata, a.is_read, a.read_at, a.created_at, a.deleted_at,
                   CASE WHEN a.entity_type = "#,
        );
        builder
            .push_bind(i16::from(EntityType::Comment))
            .push(" THEN c.rating_id ELSE a.entity_id END AS target_rating_id")
            .push(" FROM activities a LEFT JOIN comments c ON a.entity_type = ")
            .push_bind(i16::from(EntityType::Comment))
            .push(" AND c.id = a.entity_id WHERE a.recipient_user_id = ")
            .push_bind(recipient_id)
            .push(" AND a.deleted_at IS NULL");
        push_page_filter(&mut builder, &request.filter, "a.created_at", "a.id");
        builder
            .push(" ORDER BY a.created_at DESC, a.id DESC LIMIT ")
            .push_bind(request.fetch_limit() as i64);

        let rows = builder
            .build_query_as::<ActivityRow>()
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(ActivityView::try_from).collect()
    }

    async fn mark_all_read(
        &self,
        recipient_id: UserId,
        read_at: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE activities
            SET is_read = TRUE, read_at = $2
            WHERE recipient_user_id = $1 AND is_read = FALSE AND deleted_at IS NULL
            "#,
        )
        .bind(recipient_id)
        .bind(read_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn mark_one_read(
        &self,
        recipient_id: UserId,
        activity_id: ActivityId,
        read_at: DateTime<Utc>,
    ) -> Result<Option<bool>, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE activities
            SET is_read = TRUE, read_at = $3
            WHERE id = $1 AND recipient_user_id = $2 AND is_read = FALSE AND deleted_at IS NULL
            "#,
        )
        .bind(activity_id)
        .bind(recipient_id)
        .bind(read_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(Some(true));
        }

        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM activities
                WHERE id = $1 AND recipient_user_id = $2 AND deleted_at IS NULL
            )
            "#,
        )
        .bind(activity_id)
        .bind(recipient_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists.then_some(false))
    }

    async fn unread_count(&self, recipient_id: UserId) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM activities
            WHERE recipient_user_id = $1 AND is_read = FALSE AND deleted_at IS NULL
            "#,
        )
        .bind(recipient_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
