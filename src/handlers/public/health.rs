// handlers/public/health.rs - GET /health

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::app::AppState;

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();
    let version = env!("CARGO_PKG_VERSION");

    let Some(database) = &state.database else {
        return (
            StatusCode::OK,
            Json(json!({ "status": "OK", "version": version, "timestamp": now })),
        );
    };

    match database.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "OK", "version": version, "timestamp": now, "database": "ok" })),
        ),
        Err(e) => {
            tracing::error!("health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "Error", "error": "database unavailable", "timestamp": now })),
            )
        }
    }
}
