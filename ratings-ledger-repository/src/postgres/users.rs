use std::collections::HashMap;

use async_trait::async_trait;
use ratings_ledger_shared::types::{UserDisplay, UserId};

use super::PostgresRatingsRepository;
use super::rows::UserRow;
use crate::{RepositoryError, UserDirectory};

#[async_trait]
impl UserDirectory for PostgresRatingsRepository {
    async fn display_info(
        &self,
        user_ids: &[UserId],
    ) -> Result<HashMap<UserId, UserDisplay>, RepositoryError> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, handle, avatar_url FROM users WHERE id = ANY($1)",
        )
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.id, UserDisplay::from(row)))
            .collect())
    }

    async fn upsert_user(&self, user: &UserDisplay) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, handle, avatar_url)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id)
            DO UPDATE SET
                name = EXCLUDED.name,
                handle = EXCLUDED.handle,
                avatar_url = EXCLUDED.avatar_url
            "#,
        )
        .bind(user.user_id)
        .bind(&user.name)
        .bind(&user.handle)
        .bind(&user.avatar_url)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
