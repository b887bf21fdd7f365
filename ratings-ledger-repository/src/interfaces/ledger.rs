//! This module defines the transactional interface used by every mutating path:
//! votes, counter projections, activities and comments.
use chrono::{DateTime, Utc};
use ratings_ledger_shared::types::{
    Activity, Comment, EntityId, EntityType, UserId, VotableRef, Vote, VoteType, VotesCount,
    VotesDelta,
};

use crate::errors::RepositoryError;

/// Opens ledger transactions.
///
/// Everything written through one [`LedgerTransaction`] becomes visible
/// atomically on [`LedgerTransaction::commit`]. Dropping a transaction without
/// committing discards its writes.
#[async_trait::async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Begins a new transaction.
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>, RepositoryError>;
}

/// A unit of work over the vote ledger and everything that must commit with it.
#[async_trait::async_trait]
pub trait LedgerTransaction: Send {
    /// Loads and locks a votable entity for the rest of the transaction.
    ///
    /// Concurrent transactions locking the same entity serialize here, which
    /// makes the following read of the caller's existing vote race free.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(VotableRef))` - The entity, including its soft-delete state
    /// * `Ok(None)` - No such entity
    async fn lock_votable(
        &mut self,
        entity_type: EntityType,
        entity_id: EntityId,
    ) -> Result<Option<VotableRef>, RepositoryError>;

    /// Reads a user's current vote on an entity.
    async fn find_vote(
        &mut self,
        entity_type: EntityType,
        entity_id: EntityId,
        user_id: UserId,
    ) -> Result<Option<Vote>, RepositoryError>;

    async fn insert_vote(&mut self, vote: &Vote) -> Result<(), RepositoryError>;

    /// Flips the direction of an existing vote in place.
    async fn update_vote_type(
        &mut self,
        entity_type: EntityType,
        entity_id: EntityId,
        user_id: UserId,
        vote_type: VoteType,
        voted_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;

    async fn delete_vote(
        &mut self,
        entity_type: EntityType,
        entity_id: EntityId,
        user_id: UserId,
    ) -> Result<(), RepositoryError>;

    /// Applies a relative change to an entity's counter projection.
    ///
    /// The change is evaluated by the store against the current counters and
    /// clamped at zero; it is never a write of values computed by the caller.
    ///
    /// # Returns
    ///
    /// The counters after the change.
    async fn apply_votes_delta(
        &mut self,
        entity_type: EntityType,
        entity_id: EntityId,
        delta: VotesDelta,
    ) -> Result<VotesCount, RepositoryError>;

    async fn insert_activity(&mut self, activity: &Activity) -> Result<(), RepositoryError>;

    /// Soft-deletes every live activity pointing at an entity.
    ///
    /// # Returns
    ///
    /// The number of activities marked deleted.
    async fn soft_delete_activities_for_entity(
        &mut self,
        entity_type: EntityType,
        entity_id: EntityId,
        deleted_at: DateTime<Utc>,
    ) -> Result<u64, RepositoryError>;

    async fn insert_comment(&mut self, comment: &Comment) -> Result<(), RepositoryError>;

    /// Soft-deletes a comment. Returns `false` if it was already deleted.
    async fn soft_delete_comment(
        &mut self,
        comment_id: EntityId,
        deleted_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError>;

    /// Applies a relative, zero-clamped change to a rating's comment counter.
    async fn adjust_comments_count(
        &mut self,
        rating_id: EntityId,
        delta: i64,
    ) -> Result<i64, RepositoryError>;

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError>;

    async fn rollback(self: Box<Self>) -> Result<(), RepositoryError>;
}
