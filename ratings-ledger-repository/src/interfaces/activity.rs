//! Read and read-state operations over the activity log.
use chrono::{DateTime, Utc};
use ratings_ledger_shared::PageRequest;
use ratings_ledger_shared::types::{ActivityId, ActivityView, UserId};

use crate::errors::RepositoryError;

/// Queries and read-state updates for a recipient's activities.
///
/// Appends happen through [`crate::LedgerTransaction::insert_activity`] so that
/// they commit with the event that caused them.
#[async_trait::async_trait]
pub trait ActivityRepository: Send + Sync {
    /// Lists live activities of a recipient, newest first.
    ///
    /// Returns at most `request.fetch_limit()` rows with `target_rating_id`
    /// resolved and `actor` left empty for the caller to decorate.
    async fn list_activities(
        &self,
        recipient_id: UserId,
        request: &PageRequest,
    ) -> Result<Vec<ActivityView>, RepositoryError>;

    /// Marks every unread live activity of a recipient as read.
    ///
    /// # Returns
    ///
    /// The number of activities flipped.
    async fn mark_all_read(
        &self,
        recipient_id: UserId,
        read_at: DateTime<Utc>,
    ) -> Result<u64, RepositoryError>;

    /// Marks one activity as read.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(true))` - The activity was unread and is now read
    /// * `Ok(Some(false))` - The activity was already read
    /// * `Ok(None)` - No live activity with this id belongs to the recipient
    async fn mark_one_read(
        &self,
        recipient_id: UserId,
        activity_id: ActivityId,
        read_at: DateTime<Utc>,
    ) -> Result<Option<bool>, RepositoryError>;

    /// Counts unread, non-deleted activities of a recipient.
    async fn unread_count(&self, recipient_id: UserId) -> Result<i64, RepositoryError>;
}
