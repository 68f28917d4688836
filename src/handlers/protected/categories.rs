// handlers/protected/categories.rs - POST /api/keeper/category (admins only)

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::models::NewCategory;
use crate::error::ApiError;
use crate::handlers::validate::{check, validate_name};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

pub async fn category_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<NewCategory>, JsonRejection>,
) -> ApiResult<Value> {
    let Json(category) = payload?;
    check("name", validate_name(&category.name))?;

    if !state.identity.is_admin(user.user_id).await? {
        tracing::warn!(user_id = user.user_id, "non-admin attempted to create a category");
        return Err(ApiError::forbidden("Only administrators can create categories"));
    }

    let id = state.keeper.create_category(&category).await?;
    tracing::info!(category_id = id, "category created");
    Ok(ApiResponse::created(json!({
        "id": id,
        "name": category.name,
        "message": "category created",
    })))
}
