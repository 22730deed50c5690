//! Outbound notification webhook

use crate::domain::repository::{NotificationSink, SubmissionNotice};
use crate::error::{GateError, GateResult};
use std::time::Duration;

/// POSTs submission notices to a configured endpoint. With no endpoint
/// configured, notifications are skipped (the submission still counts).
pub struct WebhookNotifier {
    client: reqwest::Client,
    endpoint: Option<String>,
}

impl WebhookNotifier {
    pub fn new(endpoint: Option<String>) -> GateResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| GateError::Webhook(e.to_string()))?;
        Ok(Self { client, endpoint })
    }
}

impl NotificationSink for WebhookNotifier {
    async fn notify(&self, notice: &SubmissionNotice) -> GateResult<()> {
        let Some(endpoint) = &self.endpoint else {
            tracing::debug!(token_id = notice.token_id, "no webhook configured, skipping");
            return Ok(());
        };

        let response = self
            .client
            .post(endpoint)
            .json(notice)
            .send()
            .await
            .map_err(|e| GateError::Webhook(format!("webhook transport: {e}")))?;
        if !response.status().is_success() {
            return Err(GateError::Webhook(format!(
                "webhook returned status {}",
                response.status()
            )));
        }

        tracing::info!(token_id = notice.token_id, "submission notice delivered");
        Ok(())
    }
}
