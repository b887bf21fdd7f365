//! In-process notification channels: one actor task per recipient.
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use ratings_ledger_shared::types::UserId;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Mutex, broadcast, mpsc};
use tracing::{debug, trace};

use crate::errors::NotificationError;
use crate::notifier::{ActivitySignal, NotificationChannel};

const DEFAULT_MAILBOX_CAPACITY: usize = 32;
const DEFAULT_BROADCAST_CAPACITY: usize = 16;
const DEFAULT_IDLE_CHECK: Duration = Duration::from_secs(30);

struct RecipientChannel {
    generation: u64,
    mailbox: mpsc::Sender<()>,
    signals: broadcast::Sender<ActivitySignal>,
}

struct HubInner {
    channels: Mutex<HashMap<UserId, RecipientChannel>>,
    next_generation: AtomicU64,
    mailbox_capacity: usize,
    broadcast_capacity: usize,
    idle_check: Duration,
}

/// Registry of per-recipient actors.
///
/// An actor is spawned the first time a recipient is notified or subscribed
/// to. Its mailbox is bounded and written with `try_send`: a full mailbox
/// already guarantees a pending wake-up, so the extra one is folded in.
///
/// An actor retires, removing its entry, once its mailbox is empty and no
/// subscriber is left. It checks after every signal and every `idle_check`
/// while waiting. The next notify or subscribe spawns a fresh one.
#[derive(Clone)]
pub struct ChannelHub {
    inner: Arc<HubInner>,
}

impl Default for ChannelHub {
    fn default() -> Self {
        Self::new(DEFAULT_MAILBOX_CAPACITY, DEFAULT_BROADCAST_CAPACITY)
    }
}

impl ChannelHub {
    pub fn new(mailbox_capacity: usize, broadcast_capacity: usize) -> Self {
        Self::with_idle_check(mailbox_capacity, broadcast_capacity, DEFAULT_IDLE_CHECK)
    }

    pub fn with_idle_check(
        mailbox_capacity: usize,
        broadcast_capacity: usize,
        idle_check: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(HubInner {
                channels: Mutex::new(HashMap::new()),
                next_generation: AtomicU64::new(0),
                mailbox_capacity: mailbox_capacity.max(1),
                broadcast_capacity: broadcast_capacity.max(1),
                idle_check: idle_check.max(Duration::from_millis(1)),
            }),
        }
    }

    /// Subscribes to the wake-up signals of one recipient.
    pub async fn subscribe(&self, recipient: UserId) -> broadcast::Receiver<ActivitySignal> {
        let mut channels = self.inner.channels.lock().await;
        channels
            .entry(recipient)
            .or_insert_with(|| self.spawn_channel(recipient))
            .signals
            .subscribe()
    }

    /// Number of recipients with a live actor.
    pub async fn active_channels(&self) -> usize {
        self.inner.channels.lock().await.len()
    }

    fn spawn_channel(&self, recipient: UserId) -> RecipientChannel {
        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        let (mailbox, inbox) = mpsc::channel(self.inner.mailbox_capacity);
        let (signals, _) = broadcast::channel(self.inner.broadcast_capacity);
        let actor = RecipientActor {
            recipient,
            generation,
            inbox,
            signals: signals.clone(),
            hub: Arc::downgrade(&self.inner),
            idle_check: self.inner.idle_check,
        };
        tokio::spawn(actor.run());
        debug!(%recipient, generation, "Spawned notification channel");
        RecipientChannel {
            generation,
            mailbox,
            signals,
        }
    }
}

#[async_trait::async_trait]
impl NotificationChannel for ChannelHub {
    async fn notify(&self, recipient: UserId) -> Result<(), NotificationError> {
        let mut channels = self.inner.channels.lock().await;
        let channel = channels
            .entry(recipient)
            .or_insert_with(|| self.spawn_channel(recipient));

        match channel.mailbox.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => Ok(()),
            Err(TrySendError::Closed(())) => {
                // Only reachable if the actor died without retiring.
                channels.remove(&recipient);
                Err(NotificationError::MailboxClosed(recipient))
            }
        }
    }
}

enum Retirement {
    Retired,
    Pending,
    Subscribed,
}

struct RecipientActor {
    recipient: UserId,
    generation: u64,
    inbox: mpsc::Receiver<()>,
    signals: broadcast::Sender<ActivitySignal>,
    hub: Weak<HubInner>,
    idle_check: Duration,
}

impl RecipientActor {
    async fn run(mut self) {
        let recipient = self.recipient;
        let mut sequence = 0u64;
        let mut wakeups = 0u32;

        loop {
            if wakeups == 0 {
                match tokio::time::timeout(self.idle_check, self.inbox.recv()).await {
                    Ok(Some(())) => wakeups = 1,
                    Ok(None) => break,
                    Err(_) => {}
                }
            }
            while self.inbox.try_recv().is_ok() {
                wakeups += 1;
            }

            if wakeups > 0 {
                sequence += 1;
                let signal = ActivitySignal {
                    recipient,
                    wakeups,
                    sequence,
                };
                if self.signals.send(signal).is_err() {
                    trace!(%recipient, sequence, "No live subscribers for signal");
                }
                wakeups = 0;
            }

            if self.signals.receiver_count() == 0 {
                match self.try_retire().await {
                    Retirement::Retired => break,
                    Retirement::Pending => wakeups = 1,
                    Retirement::Subscribed => {}
                }
            }
        }
        debug!(%recipient, generation = self.generation, "Notification channel closed");
    }

    /// Removes this actor's entry if nothing is queued and nobody listens.
    ///
    /// Runs under the hub lock, which `notify` and `subscribe` also hold, so no
    /// wake-up or subscriber can slip in between the checks and the removal.
    async fn try_retire(&mut self) -> Retirement {
        let Some(hub) = self.hub.upgrade() else {
            return Retirement::Retired;
        };
        let mut channels = hub.channels.lock().await;
        if self.inbox.try_recv().is_ok() {
            return Retirement::Pending;
        }
        match channels.get(&self.recipient) {
            Some(channel) if channel.generation == self.generation => {
                if channel.signals.receiver_count() > 0 {
                    return Retirement::Subscribed;
                }
                channels.remove(&self.recipient);
                Retirement::Retired
            }
            _ => Retirement::Retired,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_subscriber_receives_all_wakeups() {
        let hub = ChannelHub::default();
        let recipient = Uuid::new_v4();
        let mut receiver = hub.subscribe(recipient).await;

        for _ in 0..3 {
            hub.notify(recipient).await.unwrap();
        }

        let mut wakeups = 0;
        let mut last_sequence = 0;
        while wakeups < 3 {
            let signal = tokio::time::timeout(Duration::from_secs(1), receiver.recv())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(signal.recipient, recipient);
            assert!(signal.sequence > last_sequence);
            last_sequence = signal.sequence;
            wakeups += signal.wakeups;
        }
        assert_eq!(wakeups, 3);
    }

    #[tokio::test]
    async fn test_channels_are_per_recipient() {
        let hub = ChannelHub::default();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let mut alice_signals = hub.subscribe(alice).await;
        let _bob_signals = hub.subscribe(bob).await;

        hub.notify(bob).await.unwrap();
        hub.notify(alice).await.unwrap();

        let signal = tokio::time::timeout(Duration::from_secs(1), alice_signals.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(signal.recipient, alice);
        assert_eq!(hub.active_channels().await, 2);
    }

    async fn wait_for_channels(hub: &ChannelHub, expected: usize) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while hub.active_channels().await != expected {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_notify_without_subscribers_succeeds() {
        let hub = ChannelHub::new(1, 1);
        let recipient = Uuid::new_v4();
        for _ in 0..5 {
            hub.notify(recipient).await.unwrap();
        }
        wait_for_channels(&hub, 0).await;
    }

    #[tokio::test]
    async fn test_one_off_recipients_do_not_accumulate() {
        let hub = ChannelHub::default();
        for _ in 0..200 {
            hub.notify(Uuid::new_v4()).await.unwrap();
        }
        wait_for_channels(&hub, 0).await;
    }

    #[tokio::test]
    async fn test_channel_retires_after_last_subscriber_leaves() {
        let hub = ChannelHub::with_idle_check(4, 4, Duration::from_millis(10));
        let recipient = Uuid::new_v4();
        let first = hub.subscribe(recipient).await;
        let second = hub.subscribe(recipient).await;
        hub.notify(recipient).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(hub.active_channels().await, 1);

        drop(first);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(hub.active_channels().await, 1);

        drop(second);
        wait_for_channels(&hub, 0).await;

        let mut receiver = hub.subscribe(recipient).await;
        hub.notify(recipient).await.unwrap();
        let signal = tokio::time::timeout(Duration::from_secs(1), receiver.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(signal.recipient, recipient);
        assert_eq!(signal.sequence, 1);
    }
}
