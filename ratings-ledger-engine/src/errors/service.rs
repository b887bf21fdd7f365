//! Error types for the ratings service.
//! Aggregates ledger and activity failures with input validation and
//! authorization errors of the content operations.
use ratings_ledger_repository::RepositoryError;
use ratings_ledger_shared::types::{EntityId, UserId};
use thiserror::Error;

use crate::errors::{ActivityError, LedgerError};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Activity(#[from] ActivityError),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("User {caller_id} is not the author of comment {comment_id}")]
    NotCommentAuthor {
        comment_id: EntityId,
        caller_id: UserId,
    },

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}
