// handlers/protected/items.rs - /api/keeper/item handlers

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Extension, Json,
};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::models::{ItemUpdate, NewItem};
use crate::error::ApiError;
use crate::handlers::validate::{check, validate_id, validate_name};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// Fields are stored exactly as sent; only a blank title or bad category id is refused
fn validate_fields(fields: &ItemUpdate) -> Result<(), ApiError> {
    check("title", validate_name(&fields.title))?;
    if let Some(category_id) = fields.category_id {
        check("category_id", validate_id(category_id))?;
    }
    Ok(())
}

/// POST /api/keeper/item - add an item to one of the caller's collections
pub async fn item_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<NewItem>, JsonRejection>,
) -> ApiResult<Value> {
    let Json(item) = payload?;
    check("collection_id", validate_id(item.collection_id))?;
    validate_fields(&item.fields)?;

    let id = state.keeper.create_item(user.user_id, &item).await?;
    tracing::info!(user_id = user.user_id, item_id = id, "item created");
    Ok(ApiResponse::created(json!({
        "id": id,
        "collection_id": item.collection_id,
        "message": "item created",
    })))
}

/// GET /api/keeper/item/:id
pub async fn item_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Value> {
    let Path(id) = id?;
    let item = state.keeper.item(user.user_id, id).await?;
    Ok(ApiResponse::success(json!({ "item": item })))
}

/// PUT /api/keeper/item/:id - replace editable fields; `collection_id` in the body is ignored
pub async fn item_put(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ItemUpdate>, JsonRejection>,
) -> ApiResult<Value> {
    let Path(id) = id?;
    let Json(update) = payload?;
    validate_fields(&update)?;

    let item = state.keeper.update_item(user.user_id, id, &update).await?;
    tracing::info!(user_id = user.user_id, item_id = id, "item updated");
    Ok(ApiResponse::success(json!({ "item": item })))
}

/// DELETE /api/keeper/item/:id
pub async fn item_delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Value> {
    let Path(id) = id?;
    state.keeper.delete_item(user.user_id, id).await?;
    tracing::info!(user_id = user.user_id, item_id = id, "item deleted");
    Ok(ApiResponse::success(json!({
        "id": id,
        "message": "item deleted",
    })))
}
