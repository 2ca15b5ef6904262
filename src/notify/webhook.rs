// notify/webhook.rs
use reqwest::blocking::Client;
use std::time::Duration;

use crate::errors::MonitorError;
use crate::notify::payload::WebhookPayload;

/// Where a finished payload goes. The run only ever sees this seam, so
/// delivery stays decoupled from persistence.
pub trait AlertSink {
    fn deliver(&self, webhook_url: &str, payload: &WebhookPayload) -> Result<(), MonitorError>;
}

pub struct WebhookSink {
    client: Client,
}

impl WebhookSink {
    pub fn new() -> Result<Self, MonitorError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| MonitorError::Delivery(e.to_string()))?;
        Ok(Self { client })
    }
}

impl AlertSink for WebhookSink {
    fn deliver(&self, webhook_url: &str, payload: &WebhookPayload) -> Result<(), MonitorError> {
        let response = self
            .client
            .post(webhook_url)
            .json(payload)
            .send()
            .map_err(|e| MonitorError::Delivery(format!("webhook request failed: {e}")))?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let text = response.text().unwrap_or_else(|_| "(no body)".to_string());
            Err(MonitorError::Delivery(format!(
                "webhook returned {status}: {text}"
            )))
        }
    }
}
