//! Fire-and-forget dispatch of wake-ups after commit.
use std::sync::Arc;
use std::time::Duration;

use ratings_ledger_shared::types::UserId;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::errors::NotificationError;
use crate::notifier::NotificationChannel;

/// Wraps a channel so that notifying can neither fail nor delay the caller.
#[derive(Clone)]
pub struct NotificationDispatcher {
    channel: Arc<dyn NotificationChannel>,
    timeout: Duration,
}

impl NotificationDispatcher {
    pub fn new(channel: Arc<dyn NotificationChannel>, timeout: Duration) -> Self {
        Self { channel, timeout }
    }

    /// Spawns the delivery of one wake-up and returns immediately.
    ///
    /// Failures and timeouts are logged and dropped. Outside a tokio runtime
    /// the signal is dropped and `None` is returned.
    pub fn dispatch(&self, recipient: UserId) -> Option<JoinHandle<()>> {
        let Ok(handle) = Handle::try_current() else {
            warn!(%recipient, "No runtime available, dropping notification");
            return None;
        };

        let channel = Arc::clone(&self.channel);
        let timeout = self.timeout;
        Some(handle.spawn(async move {
            let delivery = match tokio::time::timeout(timeout, channel.notify(recipient)).await {
                Ok(result) => result,
                Err(_) => Err(NotificationError::Timeout(timeout)),
            };
            match delivery {
                Ok(()) => debug!(%recipient, "Notification delivered"),
                Err(error) => warn!(%recipient, %error, "Notification dropped"),
            }
        }))
    }
}
