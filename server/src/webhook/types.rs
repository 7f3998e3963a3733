//! Webhook wire types.
//!
//! This module defines:
//! - `WebhookConfig`: what a delivery needs from a project
//! - `WebhookPayload`: the JSON document POSTed to the receiver
//! - `DeliveryResult`: the outcome handed back to the caller

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::model::{format_timestamp, Feedback, FeedbackType, Project, Sentiment};

/// Event names carried in the payload and the `X-FeedbackPulse-Event` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WebhookEvent {
    #[serde(rename = "feedback.created")]
    FeedbackCreated,
    #[serde(rename = "feedback.updated")]
    FeedbackUpdated,
    #[serde(rename = "feedback.deleted")]
    FeedbackDeleted,
}

impl WebhookEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookEvent::FeedbackCreated => "feedback.created",
            WebhookEvent::FeedbackUpdated => "feedback.updated",
            WebhookEvent::FeedbackDeleted => "feedback.deleted",
        }
    }
}

impl fmt::Display for WebhookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// Delivery target for one project, built by the caller from a [`Project`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookConfig {
    pub webhook_url: String,
    pub webhook_secret: String,
    pub project_id: String,
    pub project_name: String,
}

impl WebhookConfig {
    /// Deliveries are only attempted for enabled projects with both a URL and
    /// a secret configured.
    pub fn from_project(project: &Project) -> Option<Self> {
        if !project.webhook_enabled {
            return None;
        }

        let webhook_url = project.webhook_url.as_ref().filter(|u| !u.is_empty())?;
        let webhook_secret = project.webhook_secret.as_ref().filter(|s| !s.is_empty())?;

        Some(Self {
            webhook_url: webhook_url.clone(),
            webhook_secret: webhook_secret.clone(),
            project_id: project.id.clone(),
            project_name: project.name.clone(),
        })
    }
}

// =============================================================================
// Payload
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadProject {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadFeedback {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: FeedbackType,
    pub message: String,
    /// Serialized as `null` until sentiment has been analyzed.
    pub sentiment: Option<Sentiment>,
    pub created_at: String,
}

/// Body of every webhook request. Field order is the wire order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub event: WebhookEvent,
    pub timestamp: String,
    pub project: PayloadProject,
    pub feedback: PayloadFeedback,
}

impl WebhookPayload {
    /// Build a payload stamped with the current UTC time.
    pub fn new(event: WebhookEvent, config: &WebhookConfig, feedback: &Feedback) -> Self {
        Self {
            event,
            timestamp: format_timestamp(&Utc::now()),
            project: PayloadProject {
                id: config.project_id.clone(),
                name: config.project_name.clone(),
            },
            feedback: PayloadFeedback {
                id: feedback.id.clone(),
                kind: feedback.kind,
                message: feedback.message.clone(),
                sentiment: feedback.sentiment,
                created_at: format_timestamp(&feedback.created_at),
            },
        }
    }
}

// =============================================================================
// Result
// =============================================================================

/// Outcome of a single delivery attempt. Failures are values, not errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeliveryResult {
    pub fn delivered(status_code: u16) -> Self {
        Self {
            success: true,
            status_code: Some(status_code),
            error: None,
        }
    }

    pub fn rejected(status_code: u16, error: String) -> Self {
        Self {
            success: false,
            status_code: Some(status_code),
            error: Some(error),
        }
    }

    pub fn failed(error: String) -> Self {
        Self {
            success: false,
            status_code: None,
            error: Some(error),
        }
    }
}
