//! Booking notifications delivered as a JSON POST to a webhook.

use std::time::Duration;

use async_trait::async_trait;
use eyre::{Result, WrapErr};
use reqwest::Client;
use slotbook_core::errors::{BookingError, BookingResult};
use slotbook_core::notification::{BookingNotification, Notifier};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("SlotBook/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .wrap_err("Failed to build notification HTTP client")?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, notification: &BookingNotification) -> BookingResult<()> {
        let response = self
            .client
            .post(&self.url)
            .json(notification)
            .send()
            .await
            .map_err(|e| BookingError::Notification(format!("Webhook request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BookingError::Notification(format!(
                "Webhook responded with status {status}"
            )));
        }

        debug!("Booking notification delivered: {} (status: {})", self.url, status);
        Ok(())
    }
}
