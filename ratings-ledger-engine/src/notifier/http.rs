//! Notification channel backed by a remote relay exposing one addressable
//! channel per user.
use std::time::Duration;

use ratings_ledger_shared::types::UserId;
use serde_json::json;

use crate::errors::NotificationError;
use crate::notifier::NotificationChannel;

/// Posts wake-ups to `{base_url}/channels/{recipient}/wake`.
#[derive(Clone)]
pub struct HttpNotificationChannel {
    client: reqwest::Client,
    base_url: String,
}

impl HttpNotificationChannel {
    /// Creates a relay client whose requests give up after `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, NotificationError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    pub fn wake_url(&self, recipient: UserId) -> String {
        format!("{}/channels/{}/wake", self.base_url, recipient)
    }
}

#[async_trait::async_trait]
impl NotificationChannel for HttpNotificationChannel {
    async fn notify(&self, recipient: UserId) -> Result<(), NotificationError> {
        self.client
            .post(self.wake_url(recipient))
            .json(&json!({ "recipient": recipient }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::uuid;

    #[test]
    fn test_wake_url_trims_trailing_slash() {
        let channel =
            HttpNotificationChannel::new("http://relay.local:9000/", Duration::from_secs(1))
                .unwrap();
        let recipient = uuid!("a7ef0016-a2f4-44fb-82ca-a4f5c61d2cf5");
        assert_eq!(
            channel.wake_url(recipient),
            "http://relay.local:9000/channels/a7ef0016-a2f4-44fb-82ca-a4f5c61d2cf5/wake"
        );
    }

    #[tokio::test]
    async fn test_unreachable_relay_is_an_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);

        let channel =
            HttpNotificationChannel::new(format!("http://{address}"), Duration::from_millis(500))
                .unwrap();
        let result = channel.notify(uuid::Uuid::new_v4()).await;
        assert!(matches!(result, Err(NotificationError::Relay(_))));
    }
}
