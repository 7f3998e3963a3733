//! Dashboard accounts: email/password signup and login.
//!
//! Passwords are stored as bcrypt hashes; hashing and verification run on
//! the blocking pool.

use anyhow::Context;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::{info, warn};

use super::auth::AuthUser;
use super::extract::ApiJson;
use super::validation::{LoginRequest, SignupRequest};
use super::{ApiResponse, AppState};
use crate::error::AppError;
use crate::model::User;

/// bcrypt work factor.
pub const PASSWORD_HASH_COST: u32 = 10;

/// Token plus the account it was issued for.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

async fn hash_password(password: String) -> Result<String, AppError> {
    let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(password, PASSWORD_HASH_COST))
        .await
        .context("Password hashing task failed")?
        .context("Failed to hash password")?;
    Ok(hashed)
}

async fn verify_password(password: String, hash: String) -> Result<bool, AppError> {
    let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .context("Password verification task failed")?
        .context("Failed to verify password")?;
    Ok(matches)
}

fn auth_response(state: &AppState, user: User) -> Result<Json<ApiResponse<AuthResponse>>, AppError> {
    let token = state.issue_token(&user.id, &user.email)?;
    Ok(ApiResponse::ok(AuthResponse { token, user }))
}

pub async fn signup(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SignupRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponse>>), AppError> {
    req.validate()?;

    let password_hash = hash_password(req.password).await?;
    let user = state
        .store
        .create_user(&req.email, password_hash)
        .await
        .ok_or_else(|| AppError::BadRequest("A user with this email already exists".to_string()))?;

    Ok((StatusCode::CREATED, auth_response(&state, user)?))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, AppError> {
    req.validate()?;

    let user = match state.store.find_user_by_email(&req.email).await {
        Some(user) => user,
        None => {
            warn!(reason = "unknown_email", "login_failed");
            return Err(AppError::InvalidCredentials);
        }
    };

    if !verify_password(req.password, user.password_hash.clone()).await? {
        warn!(user_id = %user.id, reason = "wrong_password", "login_failed");
        return Err(AppError::InvalidCredentials);
    }

    info!(user_id = %user.id, "login_succeeded");

    auth_response(&state, user)
}

/// The account behind the bearer token.
pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let account = state
        .store
        .get_user(&user.user_id)
        .await
        .ok_or(AppError::NotFound("User not found"))?;
    Ok(ApiResponse::ok(account))
}
