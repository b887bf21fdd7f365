use std::collections::HashMap;

use ratings_ledger_shared::types::{UserDisplay, UserId};

use crate::errors::RepositoryError;

/// Lookup of user display information.
///
/// Users are owned by the authentication system; this directory only mirrors
/// what is needed to decorate activity and feed rows.
#[async_trait::async_trait]
pub trait UserDirectory: Send + Sync {
    /// Resolves display info for a batch of users. Unknown ids are omitted.
    async fn display_info(
        &self,
        user_ids: &[UserId],
    ) -> Result<HashMap<UserId, UserDisplay>, RepositoryError>;

    async fn upsert_user(&self, user: &UserDisplay) -> Result<(), RepositoryError>;
}
