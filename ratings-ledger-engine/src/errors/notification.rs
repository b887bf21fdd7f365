//! Error types for notification delivery.
//! None of these ever reach a caller of the service: the dispatcher logs and
//! drops them.
use std::time::Duration;

use ratings_ledger_shared::types::UserId;
use thiserror::Error;

/// Represents a failed best-effort delivery of a wake-up signal.
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Mailbox of recipient {0} is closed")]
    MailboxClosed(UserId),

    #[error("Relay request failed: {0}")]
    Relay(#[from] reqwest::Error),

    #[error("Delivery timed out after {0:?}")]
    Timeout(Duration),
}
