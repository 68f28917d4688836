// handlers/public/categories.rs - GET /api/keeper/categories

use axum::extract::State;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};

pub async fn categories_get(State(state): State<AppState>) -> ApiResult<Value> {
    let categories = state.keeper.categories().await?;
    Ok(ApiResponse::success(json!({ "categories": categories })))
}
