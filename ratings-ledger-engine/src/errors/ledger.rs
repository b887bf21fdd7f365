//! Error types for the vote ledger.
//! Defines the business-rule failures of a vote and the storage failures that
//! can interrupt one.
use ratings_ledger_repository::RepositoryError;
use ratings_ledger_shared::types::{EntityId, EntityType, UserId};
use thiserror::Error;

/// Represents errors that can occur while applying a vote.
///
/// `EntityNotFound` and `SelfVote` are terminal: the enclosing transaction is
/// rolled back and the error is surfaced to the caller unchanged.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("{} {entity_id} not found", .entity_type.as_str())]
    EntityNotFound {
        entity_type: EntityType,
        entity_id: EntityId,
    },

    #[error("User {voter_id} cannot vote on their own {} {entity_id}", .entity_type.as_str())]
    SelfVote {
        entity_type: EntityType,
        entity_id: EntityId,
        voter_id: UserId,
    },

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}
