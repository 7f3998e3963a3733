//! FeedbackPulse - feedback collection backend.
//!
//! Embedded widgets submit feedback with a public project key; each project
//! restricts which sites may submit and can forward events to a customer
//! endpoint as HMAC-signed webhooks.
//!
//! ## Architecture
//!
//! ```text
//! Widget → POST /api/public/feedback → origin check → Store → spawned webhook delivery
//! Dashboard → /api/auth (accounts), JWT-guarded /api/projects, /api/feedback → Store
//! ```

pub mod config;
pub mod error;
pub mod model;
pub mod origin;
pub mod sentiment;
pub mod store;
pub mod util;
pub mod web;
pub mod webhook;

// Re-export commonly used types
pub use config::Config;
pub use error::AppError;
pub use origin::is_origin_allowed;
pub use sentiment::SentimentClient;
pub use store::Store;
pub use web::{build_router, AppState};
pub use webhook::{DeliveryResult, WebhookClient, WebhookConfig, WebhookEvent};
