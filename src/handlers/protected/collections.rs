// handlers/protected/collections.rs - /api/keeper/collection(s) handlers

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::models::NewCollection;
use crate::error::ApiError;
use crate::handlers::validate::{check, validate_id, validate_name};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// PUT body: the collection id travels next to the replacement fields
#[derive(Debug, Deserialize)]
pub struct UpdateCollectionRequest {
    #[serde(default)]
    pub id: i64,
    #[serde(flatten)]
    pub fields: NewCollection,
}

fn validate_fields(fields: &NewCollection) -> Result<(), ApiError> {
    check("name", validate_name(&fields.name))?;
    if let Some(category_id) = fields.category_id {
        check("category_id", validate_id(category_id))?;
    }
    Ok(())
}

/// GET /api/keeper/collections - collections owned by the caller
pub async fn collections_get(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<Value> {
    let collections = state.keeper.collections(user.user_id).await?;
    Ok(ApiResponse::success(json!({
        "user_id": user.user_id,
        "collections": collections,
    })))
}

/// POST /api/keeper/collection
pub async fn collection_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<NewCollection>, JsonRejection>,
) -> ApiResult<Value> {
    let Json(fields) = payload?;
    validate_fields(&fields)?;

    let id = state.keeper.create_collection(user.user_id, &fields).await?;
    tracing::info!(user_id = user.user_id, collection_id = id, "collection created");
    Ok(ApiResponse::created(json!({
        "id": id,
        "user_id": user.user_id,
        "message": "collection created",
    })))
}

/// PUT /api/keeper/collection - full replacement, id in the body
pub async fn collection_put(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<UpdateCollectionRequest>, JsonRejection>,
) -> ApiResult<Value> {
    let Json(req) = payload?;
    check("id", validate_id(req.id))?;
    validate_fields(&req.fields)?;

    let collection = state
        .keeper
        .update_collection(user.user_id, req.id, &req.fields)
        .await?;
    tracing::info!(user_id = user.user_id, collection_id = req.id, "collection updated");
    Ok(ApiResponse::success(json!({ "collection": collection })))
}

/// GET /api/keeper/collection/:id - owned or public collection
pub async fn collection_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Value> {
    let Path(id) = id?;
    let collection = state.keeper.collection(user.user_id, id).await?;
    Ok(ApiResponse::success(json!({ "collection": collection })))
}

/// DELETE /api/keeper/collection/:id - removes the collection and its items
pub async fn collection_delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Value> {
    let Path(id) = id?;
    state.keeper.delete_collection(user.user_id, id).await?;
    tracing::info!(user_id = user.user_id, collection_id = id, "collection deleted");
    Ok(ApiResponse::success(json!({
        "id": id,
        "message": "collection deleted",
    })))
}

/// GET /api/keeper/collection/:id/items
pub async fn collection_items_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Value> {
    let Path(id) = id?;
    let items = state.keeper.items(user.user_id, id).await?;
    Ok(ApiResponse::success(json!({
        "collection_id": id,
        "items": items,
    })))
}
