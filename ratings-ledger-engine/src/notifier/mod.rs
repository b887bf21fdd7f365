//! Best-effort wake-up signals for activity recipients.
//!
//! A signal carries no payload beyond the recipient: clients re-fetch their
//! unread count or activity list when woken. Delivery may be dropped at any
//! point and is never retried.
mod dispatch;
mod http;
mod hub;

pub use dispatch::NotificationDispatcher;
pub use http::HttpNotificationChannel;
pub use hub::ChannelHub;

use ratings_ledger_shared::types::UserId;
use serde::{Deserialize, Serialize};

use crate::errors::NotificationError;

/// A coalesced wake-up delivered to a recipient's subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySignal {
    pub recipient: UserId,
    /// Number of notify calls folded into this signal.
    pub wakeups: u32,
    /// Per-recipient counter, increasing by one per emitted signal.
    pub sequence: u64,
}

/// A per-recipient, addressable notification channel.
#[async_trait::async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Sends one wake-up to the recipient's channel, creating it if needed.
    async fn notify(&self, recipient: UserId) -> Result<(), NotificationError>;
}
