//! HTTP mail notifier — Resend-style JSON API client.

use async_trait::async_trait;
use tracing::{debug, warn};

use verdant_core::error::NotifyError;
use verdant_core::notify::Notifier;

/// A notifier that posts messages to a mail delivery API.
pub struct HttpNotifier {
    api_url: String,
    api_key: String,
    sender: String,
    client: reqwest::Client,
}

impl HttpNotifier {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        sender: impl Into<String>,
    ) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .map_err(|e| NotifyError::Network(e.to_string()))?;

        Ok(Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            sender: sender.into(),
            client,
        })
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    fn name(&self) -> &str {
        "http"
    }

    async fn notify(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), NotifyError> {
        let payload = serde_json::json!({
            "from": self.sender,
            "to": recipient,
            "subject": subject,
            "html": body,
        });

        debug!(recipient, subject, "Posting notification");

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifyError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let detail = response.text().await.unwrap_or_default();
            warn!(status, detail = %detail, "Notification delivery failed");
            return Err(NotifyError::DeliveryFailed {
                recipient: recipient.into(),
                reason: format!("status {status}: {detail}"),
            });
        }

        Ok(())
    }
}
