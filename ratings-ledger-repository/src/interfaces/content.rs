//! Ratings, comments and vote lookups used by the list endpoints.
use ratings_ledger_shared::PageRequest;
use ratings_ledger_shared::types::{Comment, EntityId, EntityType, Rating, UserId, Vote};

use crate::errors::RepositoryError;

#[async_trait::async_trait]
pub trait ContentRepository: Send + Sync {
    async fn insert_rating(&self, rating: &Rating) -> Result<(), RepositoryError>;

    /// Fetches a rating, soft-deleted or not.
    async fn get_rating(&self, rating_id: EntityId) -> Result<Option<Rating>, RepositoryError>;

    /// Fetches a comment, soft-deleted or not.
    async fn get_comment(&self, comment_id: EntityId) -> Result<Option<Comment>, RepositoryError>;

    /// Lists live ratings newest first, optionally restricted to one tag.
    ///
    /// Returns at most `request.fetch_limit()` rows.
    async fn list_feed(
        &self,
        request: &PageRequest,
        tag: Option<&str>,
    ) -> Result<Vec<Rating>, RepositoryError>;

    /// Lists live comments of a rating newest first.
    ///
    /// Returns at most `request.fetch_limit()` rows.
    async fn list_comments(
        &self,
        rating_id: EntityId,
        request: &PageRequest,
    ) -> Result<Vec<Comment>, RepositoryError>;

    /// Reads a user's vote outside of any transaction.
    async fn get_vote(
        &self,
        entity_type: EntityType,
        entity_id: EntityId,
        user_id: UserId,
    ) -> Result<Option<Vote>, RepositoryError>;
}
