//! Feedback browsing, sentiment, deletion and labels.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use tracing::info;

use super::auth::AuthUser;
use super::extract::{ApiJson, ApiQuery};
use super::projects::owned_project;
use super::validation::{validate_label, AddLabelRequest, FeedbackQuery};
use super::{ApiResponse, AppState};
use crate::error::AppError;
use crate::model::{Feedback, Label, Page, Project};
use crate::webhook::WebhookEvent;

async fn owned_feedback(
    state: &AppState,
    feedback_id: &str,
    user: &AuthUser,
) -> Result<(Feedback, Project), AppError> {
    state
        .store
        .find_owned_feedback(feedback_id, &user.user_id)
        .await
        .ok_or(AppError::NotFound("Feedback not found"))
}

pub async fn list_feedback(
    State(state): State<AppState>,
    user: AuthUser,
    Path(project_id): Path<String>,
    ApiQuery(query): ApiQuery<FeedbackQuery>,
) -> Result<Json<ApiResponse<Page<Feedback>>>, AppError> {
    let filter = query.into_filter()?;
    owned_project(&state, &project_id, &user).await?;

    let page = state.store.list_feedback(&project_id, &filter).await;

    Ok(ApiResponse::ok(page))
}

pub async fn export_feedback(
    State(state): State<AppState>,
    user: AuthUser,
    Path(project_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<Feedback>>>, AppError> {
    let stats = owned_project(&state, &project_id, &user).await?;
    let feedback = state.store.export_feedback(&project_id).await;

    info!(
        project_id = %stats.project.id,
        count = feedback.len(),
        "feedback_exported"
    );

    Ok(ApiResponse::ok(feedback))
}

/// Classify a feedback message, store the result and notify the webhook.
pub async fn analyze_sentiment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(feedback_id): Path<String>,
) -> Result<Json<ApiResponse<Feedback>>, AppError> {
    let (feedback, project) = owned_feedback(&state, &feedback_id, &user).await?;

    let sentiment = state.sentiment.analyze(&feedback.message).await?;

    let updated = state
        .store
        .set_sentiment(&feedback.id, sentiment)
        .await
        .ok_or(AppError::NotFound("Feedback not found"))?;

    let _ = state.dispatch_webhook(&project, &updated, WebhookEvent::FeedbackUpdated);

    Ok(ApiResponse::ok(updated))
}

pub async fn delete_feedback(
    State(state): State<AppState>,
    user: AuthUser,
    Path(feedback_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let (_, project) = owned_feedback(&state, &feedback_id, &user).await?;

    let removed = state
        .store
        .delete_feedback(&feedback_id)
        .await
        .ok_or(AppError::NotFound("Feedback not found"))?;

    info!(project_id = %project.id, feedback_id = %removed.id, "feedback_deleted");

    let _ = state.dispatch_webhook(&project, &removed, WebhookEvent::FeedbackDeleted);

    Ok(Json(json!({
        "success": true,
        "message": "Feedback deleted successfully",
    })))
}

// =============================================================================
// Labels
// =============================================================================

pub async fn list_labels(
    State(state): State<AppState>,
    user: AuthUser,
    Path(feedback_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<Label>>>, AppError> {
    owned_feedback(&state, &feedback_id, &user).await?;
    Ok(ApiResponse::ok(state.store.list_labels(&feedback_id).await))
}

pub async fn add_label(
    State(state): State<AppState>,
    user: AuthUser,
    Path(feedback_id): Path<String>,
    ApiJson(req): ApiJson<AddLabelRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Label>>), AppError> {
    let label = validate_label(&req.label)?;
    owned_feedback(&state, &feedback_id, &user).await?;

    let label = state
        .store
        .add_label(&feedback_id, label)
        .await
        .ok_or(AppError::NotFound("Feedback not found"))?;

    Ok((StatusCode::CREATED, ApiResponse::ok(label)))
}

pub async fn remove_label(
    State(state): State<AppState>,
    user: AuthUser,
    Path((feedback_id, label_id)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    owned_feedback(&state, &feedback_id, &user).await?;

    if !state.store.remove_label(&feedback_id, &label_id).await {
        return Err(AppError::NotFound("Label not found"));
    }

    Ok(Json(json!({
        "success": true,
        "message": "Label removed successfully",
    })))
}
