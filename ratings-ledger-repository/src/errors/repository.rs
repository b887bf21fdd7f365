//! Error types for the ratings repository.
//! Defines specific errors that can occur during storage operations.
use ratings_ledger_shared::types::InvalidCode;
use thiserror::Error;

/// Represents errors that can occur within the ratings repository.
///
/// This enum consolidates the error conditions of every backend: SQLx errors
/// during database operations, migration failures, and stored discriminants
/// that no longer map to a known variant.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid stored value: {0}")]
    InvalidCode(#[from] InvalidCode),

    #[error("Row not found: {0}")]
    MissingRow(String),
}
