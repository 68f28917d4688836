//! HTTP transport for the identity RPC calls.
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use super::service::{AuthError, AuthService};
use crate::identity::{
    IsAdminRequest, IsAdminResponse, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse,
    RpcCode, RpcStatus, IS_ADMIN_PATH, LOGIN_PATH, REGISTER_PATH,
};

/// Failed call, rendered as an [`RpcStatus`] body with the matching HTTP status
#[derive(Debug)]
pub struct RpcFailure(RpcStatus);

impl RpcFailure {
    fn new(code: RpcCode, message: impl Into<String>) -> Self {
        Self(RpcStatus {
            code,
            message: message.into(),
        })
    }
}

impl From<AuthError> for RpcFailure {
    fn from(err: AuthError) -> Self {
        let code = match &err {
            AuthError::InvalidArgument(_) | AuthError::InvalidApp => RpcCode::InvalidArgument,
            AuthError::UserExists => RpcCode::AlreadyExists,
            AuthError::UserNotFound => RpcCode::NotFound,
            AuthError::InvalidCredentials => RpcCode::Unauthenticated,
            AuthError::Internal(_) => RpcCode::Internal,
        };
        RpcFailure::new(code, err.to_string())
    }
}

impl From<JsonRejection> for RpcFailure {
    fn from(rejection: JsonRejection) -> Self {
        RpcFailure::new(RpcCode::InvalidArgument, rejection.body_text())
    }
}

impl IntoResponse for RpcFailure {
    fn into_response(self) -> Response {
        (self.0.code.http_status(), Json(self.0)).into_response()
    }
}

type RpcResult<T> = Result<Json<T>, RpcFailure>;

pub fn router(service: Arc<AuthService>, request_timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(REGISTER_PATH, post(register))
        .route(LOGIN_PATH, post(login))
        .route(IS_ADMIN_PATH, post(is_admin))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "OK" })))
}

async fn register(
    State(service): State<Arc<AuthService>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> RpcResult<RegisterResponse> {
    let Json(request) = payload?;
    let user_id = service.register(&request.email, &request.password).await?;
    Ok(Json(RegisterResponse { user_id }))
}

async fn login(
    State(service): State<Arc<AuthService>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> RpcResult<LoginResponse> {
    let Json(request) = payload?;
    let token = service
        .login(&request.email, &request.password, request.app_id)
        .await?;
    Ok(Json(LoginResponse { token }))
}

async fn is_admin(
    State(service): State<Arc<AuthService>>,
    payload: Result<Json<IsAdminRequest>, JsonRejection>,
) -> RpcResult<IsAdminResponse> {
    let Json(request) = payload?;
    let is_admin = service.is_admin(request.user_id).await?;
    Ok(Json(IsAdminResponse { is_admin }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sso::storage::MemoryCredentialStore;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use serde_json::Value;
    use tower::ServiceExt;

    fn app() -> Router {
        let store = MemoryCredentialStore::with_app(1, "keeper", "secret");
        let service = AuthService::new(Arc::new(store), Duration::from_secs(60));
        router(Arc::new(service), Duration::from_secs(5))
    }

    async fn post_json(app: Router, path: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn register_returns_user_id() {
        let (status, body) = post_json(
            app(),
            REGISTER_PATH,
            r#"{"email":"ann@example.com","password":"pw"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user_id"], 1);
    }

    #[tokio::test]
    async fn malformed_body_is_invalid_argument() {
        let (status, body) = post_json(app(), REGISTER_PATH, "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_ARGUMENT");
    }

    #[tokio::test]
    async fn unknown_user_login_is_not_found() {
        let (status, body) = post_json(
            app(),
            LOGIN_PATH,
            r#"{"email":"ghost@example.com","password":"pw","app_id":1}"#,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }
}
