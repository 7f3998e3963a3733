//! Per-project webhook settings and the manual test send.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use super::auth::AuthUser;
use super::extract::ApiJson;
use super::projects::owned_project;
use super::validation::WebhookSettingsRequest;
use super::{ApiResponse, AppState};
use crate::error::AppError;
use crate::model::{Feedback, FeedbackType, Project};
use crate::store::WebhookUpdate;
use crate::webhook::{WebhookConfig, WebhookEvent};

pub const TEST_FEEDBACK_ID: &str = "test_feedback_id";
pub const TEST_FEEDBACK_MESSAGE: &str = "This is a test webhook from FeedbackPulse. \
     If you received this, your webhook integration is working correctly!";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookSettingsResponse {
    pub webhook_url: Option<String>,
    pub webhook_secret: Option<String>,
    pub webhook_enabled: bool,
}

impl From<Project> for WebhookSettingsResponse {
    fn from(p: Project) -> Self {
        Self {
            webhook_url: p.webhook_url,
            webhook_secret: p.webhook_secret,
            webhook_enabled: p.webhook_enabled,
        }
    }
}

pub async fn get_settings(
    State(state): State<AppState>,
    user: AuthUser,
    Path(project_id): Path<String>,
) -> Result<Json<ApiResponse<WebhookSettingsResponse>>, AppError> {
    let stats = owned_project(&state, &project_id, &user).await?;
    Ok(ApiResponse::ok(stats.project.into()))
}

pub async fn update_settings(
    State(state): State<AppState>,
    user: AuthUser,
    Path(project_id): Path<String>,
    ApiJson(req): ApiJson<WebhookSettingsRequest>,
) -> Result<Json<ApiResponse<WebhookSettingsResponse>>, AppError> {
    req.validate()?;

    let project = state
        .store
        .update_webhook(
            &project_id,
            &user.user_id,
            WebhookUpdate {
                webhook_url: req.webhook_url,
                webhook_enabled: req.webhook_enabled,
            },
        )
        .await
        .ok_or(AppError::NotFound("Project not found"))?;

    info!(
        project_id = %project.id,
        webhook_enabled = project.webhook_enabled,
        webhook_url_set = project.webhook_url.is_some(),
        "webhook_settings_updated"
    );

    Ok(ApiResponse::ok(project.into()))
}

pub async fn regenerate_secret(
    State(state): State<AppState>,
    user: AuthUser,
    Path(project_id): Path<String>,
) -> Result<Json<ApiResponse<WebhookSettingsResponse>>, AppError> {
    let project = state
        .store
        .regenerate_webhook_secret(&project_id, &user.user_id)
        .await
        .ok_or(AppError::NotFound("Project not found"))?;

    Ok(ApiResponse::ok(project.into()))
}

fn test_feedback(project_id: &str) -> Feedback {
    Feedback {
        id: TEST_FEEDBACK_ID.to_string(),
        project_id: project_id.to_string(),
        kind: FeedbackType::Feature,
        message: TEST_FEEDBACK_MESSAGE.to_string(),
        sentiment: None,
        created_at: Utc::now(),
        labels: Vec::new(),
    }
}

/// Send a fixed `feedback.created` payload and report the outcome inline.
///
/// Ignores the enabled flag so a webhook can be checked before switching it on.
pub async fn test_webhook(
    State(state): State<AppState>,
    user: AuthUser,
    Path(project_id): Path<String>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let project = owned_project(&state, &project_id, &user).await?.project;

    let (webhook_url, webhook_secret) = match (project.webhook_url, project.webhook_secret) {
        (Some(url), Some(secret)) => (url, secret),
        _ => {
            return Err(AppError::BadRequest(
                "Webhook URL and secret must be configured first".to_string(),
            ))
        }
    };

    let config = WebhookConfig {
        webhook_url,
        webhook_secret,
        project_id: project.id.clone(),
        project_name: project.name,
    };

    let result = state
        .webhooks
        .send(&config, &test_feedback(&project.id), WebhookEvent::FeedbackCreated)
        .await;

    if result.success {
        Ok((
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "Test webhook sent successfully",
                "statusCode": result.status_code,
            })),
        ))
    } else {
        Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "success": false,
                "error": result.error.unwrap_or_else(|| "Webhook delivery failed".to_string()),
                "statusCode": result.status_code,
            })),
        ))
    }
}
