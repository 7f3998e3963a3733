//! Webhook delivery - one signed POST per event, bounded by a timeout.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{error, info, warn};
use url::Url;

use super::signature::sign;
use super::types::{DeliveryResult, WebhookConfig, WebhookEvent, WebhookPayload};
use crate::model::Feedback;

pub const SIGNATURE_HEADER: &str = "X-FeedbackPulse-Signature";
pub const EVENT_HEADER: &str = "X-FeedbackPulse-Event";
pub const TIMESTAMP_HEADER: &str = "X-FeedbackPulse-Timestamp";
pub const USER_AGENT: &str = "FeedbackPulse-Webhook/1.0";

/// Default bound on a single delivery, connect through response headers.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Sends webhook notifications. Cheap to clone; clones share a connection pool.
#[derive(Clone)]
pub struct WebhookClient {
    client: Client,
    timeout: Duration,
}

impl WebhookClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to create webhook HTTP client")?;

        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Deliver `event` for `feedback` to the configured endpoint.
    ///
    /// Makes exactly one attempt. HTTP errors, network errors and timeouts
    /// all come back as an unsuccessful [`DeliveryResult`].
    pub async fn send(
        &self,
        config: &WebhookConfig,
        feedback: &Feedback,
        event: WebhookEvent,
    ) -> DeliveryResult {
        let payload = WebhookPayload::new(event, config, feedback);

        let body = match serde_json::to_vec(&payload) {
            Ok(b) => b,
            Err(e) => {
                error!(project_id = %config.project_id, error = %e, "webhook_payload_serialize_failed");
                return DeliveryResult::failed(e.to_string());
            }
        };

        let signature = sign(&body, &config.webhook_secret);

        info!(
            url = %config.webhook_url,
            project_id = %config.project_id,
            feedback_id = %feedback.id,
            event = %event,
            body_length = body.len(),
            "webhook_delivery_starting"
        );

        let request = self
            .client
            .post(&config.webhook_url)
            .timeout(self.timeout)
            .header(CONTENT_TYPE, "application/json")
            .header(SIGNATURE_HEADER, signature)
            .header(EVENT_HEADER, event.as_str())
            .header(TIMESTAMP_HEADER, payload.timestamp.as_str())
            .body(body);

        match request.send().await {
            Ok(resp) => {
                let status = resp.status();

                if status.is_success() {
                    info!(
                        url = %config.webhook_url,
                        project_id = %config.project_id,
                        status_code = status.as_u16(),
                        "webhook_delivered"
                    );
                    DeliveryResult::delivered(status.as_u16())
                } else {
                    let message = format!(
                        "HTTP {}: {}",
                        status.as_u16(),
                        status.canonical_reason().unwrap_or("Unknown Status")
                    );
                    warn!(
                        url = %config.webhook_url,
                        project_id = %config.project_id,
                        status_code = status.as_u16(),
                        error = %message,
                        "webhook_delivery_rejected"
                    );
                    DeliveryResult::rejected(status.as_u16(), message)
                }
            }
            Err(e) => {
                let message = if e.is_timeout() {
                    error!(
                        url = %config.webhook_url,
                        project_id = %config.project_id,
                        timeout_seconds = self.timeout.as_secs_f64(),
                        error = %e,
                        "webhook_delivery_timeout"
                    );
                    format!("Request timed out after {}ms", self.timeout.as_millis())
                } else {
                    error!(
                        url = %config.webhook_url,
                        project_id = %config.project_id,
                        error = %e,
                        "webhook_delivery_error"
                    );
                    e.to_string()
                };
                DeliveryResult::failed(message)
            }
        }
    }
}

/// Whether `url` is an absolute `http` or `https` URL.
///
/// Checked when a webhook is configured, not at delivery time.
pub fn is_valid_webhook_url(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
        Err(_) => false,
    }
}
