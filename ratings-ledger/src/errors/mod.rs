//! Error types for the Ratings Ledger application.
//! Consolidates configuration, storage, notification and server errors that
//! can stop the process during startup or serving.
use ratings_ledger_engine::errors::NotificationError;
use ratings_ledger_repository::RepositoryError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
    #[error("Notification error: {0}")]
    Notification(#[from] NotificationError),
    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
