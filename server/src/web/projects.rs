//! Project management for dashboard users.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use super::auth::AuthUser;
use super::embed::embed_snippet;
use super::extract::ApiJson;
use super::validation::{
    normalize_allowed_domains, validate_project_name, CreateProjectRequest, UpdateProjectRequest,
};
use super::{ApiResponse, AppState};
use crate::error::AppError;
use crate::model::{to_iso8601, Project, WidgetSettings};
use crate::store::{NewProject, ProjectStats, ProjectUpdate};

/// Project as the dashboard sees it. Webhook settings have their own endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    pub id: String,
    pub name: String,
    pub project_key: String,
    #[serde(serialize_with = "to_iso8601")]
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub widget: WidgetSettings,
    pub allowed_domains: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embed_snippet: Option<String>,
}

impl From<Project> for ProjectResponse {
    fn from(p: Project) -> Self {
        Self {
            id: p.id,
            name: p.name,
            project_key: p.project_key,
            created_at: p.created_at,
            widget: p.widget,
            allowed_domains: p.allowed_domains,
            feedback_count: None,
            embed_snippet: None,
        }
    }
}

impl From<ProjectStats> for ProjectResponse {
    fn from(stats: ProjectStats) -> Self {
        Self {
            feedback_count: Some(stats.feedback_count),
            ..stats.project.into()
        }
    }
}

pub(crate) async fn owned_project(
    state: &AppState,
    project_id: &str,
    user: &AuthUser,
) -> Result<ProjectStats, AppError> {
    state
        .store
        .get_project(project_id, &user.user_id)
        .await
        .ok_or(AppError::NotFound("Project not found"))
}

pub async fn create_project(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ProjectResponse>>), AppError> {
    let input = NewProject {
        name: validate_project_name(&req.name)?,
        widget: req.widget.apply(WidgetSettings::default())?,
        allowed_domains: normalize_allowed_domains(req.allowed_domains)?,
    };

    let project = state.store.create_project(&user.user_id, input).await?;

    let mut response = ProjectResponse::from(project);
    response.feedback_count = Some(0);
    response.embed_snippet = Some(embed_snippet(
        &state.config.public_base_url,
        &response.project_key,
        &response.widget,
    ));

    Ok((StatusCode::CREATED, ApiResponse::ok(response)))
}

pub async fn list_projects(
    State(state): State<AppState>,
    user: AuthUser,
) -> Json<ApiResponse<Vec<ProjectResponse>>> {
    let projects = state
        .store
        .list_projects(&user.user_id)
        .await
        .into_iter()
        .map(ProjectResponse::from)
        .collect();

    ApiResponse::ok(projects)
}

pub async fn get_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(project_id): Path<String>,
) -> Result<Json<ApiResponse<ProjectResponse>>, AppError> {
    let stats = owned_project(&state, &project_id, &user).await?;

    let mut response = ProjectResponse::from(stats);
    response.embed_snippet = Some(embed_snippet(
        &state.config.public_base_url,
        &response.project_key,
        &response.widget,
    ));

    Ok(ApiResponse::ok(response))
}

pub async fn update_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(project_id): Path<String>,
    ApiJson(req): ApiJson<UpdateProjectRequest>,
) -> Result<Json<ApiResponse<ProjectResponse>>, AppError> {
    let current = owned_project(&state, &project_id, &user).await?;
    let (name, widget, allowed_domains) = req.into_parts(&current.project.widget)?;

    let project = state
        .store
        .update_project(
            &project_id,
            &user.user_id,
            ProjectUpdate {
                name,
                widget,
                allowed_domains,
            },
        )
        .await
        .ok_or(AppError::NotFound("Project not found"))?;

    Ok(ApiResponse::ok(project.into()))
}

pub async fn delete_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(project_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    if !state.store.delete_project(&project_id, &user.user_id).await {
        return Err(AppError::NotFound("Project not found"));
    }

    Ok(Json(json!({
        "success": true,
        "message": "Project deleted successfully",
    })))
}

/// Issue a new public key. Snippets embedding the old key stop working.
pub async fn regenerate_key(
    State(state): State<AppState>,
    user: AuthUser,
    Path(project_id): Path<String>,
) -> Result<Json<ApiResponse<ProjectResponse>>, AppError> {
    let project = state
        .store
        .regenerate_project_key(&project_id, &user.user_id)
        .await?
        .ok_or(AppError::NotFound("Project not found"))?;

    let mut response = ProjectResponse::from(project);
    response.embed_snippet = Some(embed_snippet(
        &state.config.public_base_url,
        &response.project_key,
        &response.widget,
    ));

    Ok(ApiResponse::ok(response))
}
