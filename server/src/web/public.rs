//! Widget submission endpoint.
//!
//! Unauthenticated: the project key identifies the project and the
//! project's allowed-domain list decides which sites may submit.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use tracing::{info, warn};

use super::extract::ApiJson;
use super::validation::SubmitFeedbackRequest;
use super::{ApiResponse, AppState};
use crate::error::AppError;
use crate::model::Feedback;
use crate::origin::{is_origin_allowed, request_origin};
use crate::util::is_valid_project_key;
use crate::webhook::WebhookEvent;

/// Accept a feedback submission from an embedded widget.
pub async fn submit_feedback(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(req): ApiJson<SubmitFeedbackRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Feedback>>), AppError> {
    req.validate()?;

    let project = if is_valid_project_key(&req.project_key) {
        state.store.get_project_by_key(&req.project_key).await
    } else {
        None
    }
    .ok_or(AppError::NotFound("Invalid project key"))?;

    let origin = request_origin(&headers);
    if !is_origin_allowed(origin.as_deref(), project.allowed_domains.as_deref()) {
        warn!(
            project_id = %project.id,
            origin = origin.as_deref().unwrap_or(""),
            "feedback_origin_rejected"
        );
        return Err(AppError::OriginNotAllowed);
    }

    let feedback = state
        .store
        .insert_feedback(&project.id, req.kind, req.message)
        .await
        .ok_or(AppError::NotFound("Invalid project key"))?;

    info!(
        project_id = %project.id,
        feedback_id = %feedback.id,
        feedback_type = %feedback.kind,
        "feedback_received"
    );

    // The submitter never waits on the customer's endpoint.
    let _ = state.dispatch_webhook(&project, &feedback, WebhookEvent::FeedbackCreated);

    Ok((StatusCode::CREATED, ApiResponse::ok(feedback)))
}
