//! HTTP layer.
//!
//! Two route groups share one router:
//! - the public submission endpoint, callable from any site (origin checks
//!   happen per project in the handler)
//! - the dashboard API, restricted to the configured frontend origins and
//!   guarded by bearer tokens issued by the account endpoints

pub mod accounts;
pub mod auth;
pub mod embed;
pub mod extract;
pub mod feedback;
pub mod projects;
pub mod public;
pub mod validation;
pub mod webhooks;

use std::sync::Arc;

use axum::extract::OriginalUri;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tokio::task::JoinHandle;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::config::Config;
use crate::error::AppError;
use crate::model::{format_timestamp, Feedback, Project};
use crate::sentiment::SentimentClient;
use crate::store::Store;
use crate::webhook::{DeliveryResult, WebhookClient, WebhookConfig, WebhookEvent};

pub use auth::{issue_token, verify_token, AuthUser, Claims};
pub use embed::embed_snippet;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Store,
    pub webhooks: WebhookClient,
    pub sentiment: SentimentClient,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Store,
        webhooks: WebhookClient,
        sentiment: SentimentClient,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            webhooks,
            sentiment,
        }
    }

    /// Token for `user_id` with the configured lifetime.
    pub fn issue_token(&self, user_id: &str, email: &str) -> Result<String, AppError> {
        issue_token(
            user_id,
            email,
            &self.config.jwt_secret,
            self.config.jwt_expires_secs,
        )
    }

    /// Fire-and-forget delivery of `event` when the project has webhooks on.
    ///
    /// The handle is returned so callers that care (tests) can await the
    /// outcome; request handlers drop it.
    pub fn dispatch_webhook(
        &self,
        project: &Project,
        feedback: &Feedback,
        event: WebhookEvent,
    ) -> Option<JoinHandle<DeliveryResult>> {
        let config = WebhookConfig::from_project(project)?;
        let client = self.webhooks.clone();
        let feedback = feedback.clone();

        Some(tokio::spawn(async move {
            client.send(&config, &feedback, event).await
        }))
    }
}

/// Success envelope shared by every JSON endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

// =============================================================================
// Router
// =============================================================================

fn public_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

fn dashboard_cors(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "invalid_frontend_origin_ignored");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

/// Build the full application router.
pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/api/public/feedback", post(public::submit_feedback))
        .layer(public_cors());

    let dashboard = Router::new()
        .route("/api/auth/signup", post(accounts::signup))
        .route("/api/auth/login", post(accounts::login))
        .route("/api/auth/me", get(accounts::me))
        .route(
            "/api/projects",
            post(projects::create_project).get(projects::list_projects),
        )
        .route(
            "/api/projects/:project_id",
            get(projects::get_project)
                .put(projects::update_project)
                .delete(projects::delete_project),
        )
        .route(
            "/api/projects/:project_id/regenerate-key",
            post(projects::regenerate_key),
        )
        .route(
            "/api/projects/:project_id/feedback",
            get(feedback::list_feedback),
        )
        .route(
            "/api/projects/:project_id/feedback/export",
            get(feedback::export_feedback),
        )
        .route(
            "/api/projects/:project_id/webhook",
            get(webhooks::get_settings).put(webhooks::update_settings),
        )
        .route(
            "/api/projects/:project_id/webhook/regenerate-secret",
            post(webhooks::regenerate_secret),
        )
        .route(
            "/api/projects/:project_id/webhook/test",
            post(webhooks::test_webhook),
        )
        .route(
            "/api/feedback/:feedback_id",
            delete(feedback::delete_feedback),
        )
        .route(
            "/api/feedback/:feedback_id/sentiment",
            post(feedback::analyze_sentiment),
        )
        .route(
            "/api/feedback/:feedback_id/labels",
            get(feedback::list_labels).post(feedback::add_label),
        )
        .route(
            "/api/feedback/:feedback_id/labels/:label_id",
            delete(feedback::remove_label),
        )
        .layer(dashboard_cors(&state.config.frontend_origins));

    Router::new()
        .route("/health", get(health))
        .merge(public)
        .merge(dashboard)
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// Health Check
// =============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: format_timestamp(&Utc::now()),
    })
}

async fn not_found(method: Method, OriginalUri(uri): OriginalUri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "kind": "NOT_FOUND",
            "error": format!("Route {} {} not found", method, uri.path()),
        })),
    )
}
