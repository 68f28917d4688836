// handlers/public/auth.rs - POST /api/auth/register, POST /api/auth/login

use axum::{
    extract::{rejection::JsonRejection, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::app::AppState;
use crate::error::ApiError;
use crate::handlers::validate::{check, validate_email_format, validate_password, validate_username_format};
use crate::identity::RpcCode;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    /// Optional; must match the configured application when present
    pub app_id: Option<i32>,
}

/// POST /api/auth/register - create credentials in keeper-sso, then the local profile
///
/// ```json
/// { "username": "ann", "email": "ann@example.com", "password": "secret1" }
/// ```
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<serde_json::Value> {
    let Json(req) = payload?;
    let username = req.username.trim();
    let email = req.email.trim();

    check("username", validate_username_format(username))?;
    check("email", validate_email_format(email))?;
    check("password", validate_password(&req.password))?;

    let user_id = state.identity.register(email, &req.password).await?;
    state.keeper.register_profile(user_id, email, username).await?;

    tracing::info!(user_id, "user registered");
    Ok(ApiResponse::created(json!({
        "user_id": user_id,
        "message": "user registered",
    })))
}

/// POST /api/auth/login - exchange credentials for a bearer token
///
/// The token is returned in the body and in the `Authorization` header.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let email = req.email.trim();

    check("email", validate_email_format(email))?;
    if req.password.is_empty() {
        return Err(ApiError::invalid_field("password", "Password cannot be empty"));
    }
    if let Some(app_id) = req.app_id {
        if app_id != state.auth.app_id {
            return Err(ApiError::invalid_field("app_id", "unknown application"));
        }
    }

    let token = state
        .identity
        .login(email, &req.password, state.auth.app_id)
        .await
        .map_err(|e| match e.code {
            RpcCode::NotFound | RpcCode::Unauthenticated => {
                ApiError::unauthorized("invalid email or password")
            }
            _ => ApiError::from(e),
        })?;

    if let Err(e) = state.keeper.record_login(email).await {
        tracing::warn!("failed to record last login: {}", e);
    }

    let bearer = format!("Bearer {}", token);
    Ok((
        [(header::AUTHORIZATION, bearer)],
        ApiResponse::success(json!({ "token": token })),
    ))
}
