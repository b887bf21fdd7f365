//! Error types for the activity recorder.
use ratings_ledger_repository::RepositoryError;
use ratings_ledger_shared::types::ActivityId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ActivityError {
    #[error("Activity {0} not found")]
    ActivityNotFound(ActivityId),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}
