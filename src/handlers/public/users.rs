// handlers/public/users.rs - GET /api/keeper/users

use axum::extract::State;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /api/keeper/users - all profiles, ordered by user id
pub async fn users_get(State(state): State<AppState>) -> ApiResult<Value> {
    let users = state.keeper.users().await?;
    Ok(ApiResponse::success(json!({ "users": users })))
}
