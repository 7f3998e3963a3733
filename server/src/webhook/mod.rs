//! Outbound webhooks.
//!
//! This module provides:
//! - Secret generation for newly configured endpoints
//! - HMAC-SHA256 signing and verification of payloads
//! - A single-attempt, timeout-bounded delivery client
//!
//! ## Flow
//!
//! ```text
//! Feedback saved → WebhookConfig::from_project → WebhookClient::send → DeliveryResult (logged)
//! ```

pub mod delivery;
pub mod secret;
pub mod signature;
pub mod types;

pub use delivery::{
    is_valid_webhook_url, WebhookClient, DEFAULT_TIMEOUT, EVENT_HEADER, SIGNATURE_HEADER,
    TIMESTAMP_HEADER, USER_AGENT,
};
pub use secret::generate_secret;
pub use signature::{sign, verify};
pub use types::{DeliveryResult, WebhookConfig, WebhookEvent, WebhookPayload};
