//! Wire contract between keeper-api and keeper-sso.
//!
//! Calls are JSON bodies POSTed to fixed paths. Failures carry a
//! gRPC-style status code in an [`RpcStatus`] body together with the
//! matching HTTP status, so either side can classify an error without
//! parsing messages.

use async_trait::async_trait;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub mod client;

pub use client::IdentityClient;

pub const REGISTER_PATH: &str = "/rpc/auth/register";
pub const LOGIN_PATH: &str = "/rpc/auth/login";
pub const IS_ADMIN_PATH: &str = "/rpc/auth/is_admin";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RpcCode {
    InvalidArgument,
    NotFound,
    AlreadyExists,
    Unauthenticated,
    PermissionDenied,
    ResourceExhausted,
    Aborted,
    DeadlineExceeded,
    Unavailable,
    Internal,
}

impl RpcCode {
    /// Codes the client retries; everything else is final
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            RpcCode::ResourceExhausted
                | RpcCode::Aborted
                | RpcCode::DeadlineExceeded
                | RpcCode::Unavailable
        )
    }

    pub fn http_status(self) -> StatusCode {
        match self {
            RpcCode::InvalidArgument => StatusCode::BAD_REQUEST,
            RpcCode::NotFound => StatusCode::NOT_FOUND,
            RpcCode::AlreadyExists | RpcCode::Aborted => StatusCode::CONFLICT,
            RpcCode::Unauthenticated => StatusCode::UNAUTHORIZED,
            RpcCode::PermissionDenied => StatusCode::FORBIDDEN,
            RpcCode::ResourceExhausted => StatusCode::TOO_MANY_REQUESTS,
            RpcCode::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
            RpcCode::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            RpcCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Best-effort classification when the peer sent no status body
    pub fn from_http_status(status: StatusCode) -> Self {
        match status {
            StatusCode::BAD_REQUEST => RpcCode::InvalidArgument,
            StatusCode::NOT_FOUND => RpcCode::NotFound,
            StatusCode::CONFLICT => RpcCode::AlreadyExists,
            StatusCode::UNAUTHORIZED => RpcCode::Unauthenticated,
            StatusCode::FORBIDDEN => RpcCode::PermissionDenied,
            StatusCode::TOO_MANY_REQUESTS => RpcCode::ResourceExhausted,
            StatusCode::GATEWAY_TIMEOUT | StatusCode::REQUEST_TIMEOUT => RpcCode::DeadlineExceeded,
            StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY => RpcCode::Unavailable,
            _ => RpcCode::Internal,
        }
    }
}

impl fmt::Display for RpcCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RpcCode::InvalidArgument => "INVALID_ARGUMENT",
            RpcCode::NotFound => "NOT_FOUND",
            RpcCode::AlreadyExists => "ALREADY_EXISTS",
            RpcCode::Unauthenticated => "UNAUTHENTICATED",
            RpcCode::PermissionDenied => "PERMISSION_DENIED",
            RpcCode::ResourceExhausted => "RESOURCE_EXHAUSTED",
            RpcCode::Aborted => "ABORTED",
            RpcCode::DeadlineExceeded => "DEADLINE_EXCEEDED",
            RpcCode::Unavailable => "UNAVAILABLE",
            RpcCode::Internal => "INTERNAL",
        };
        f.write_str(name)
    }
}

/// Error body returned by keeper-sso
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcStatus {
    pub code: RpcCode,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub app_id: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsAdminRequest {
    pub user_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsAdminResponse {
    pub is_admin: bool,
}

/// Failure reported by (or while reaching) the identity service
#[derive(Debug, Clone, Error)]
#[error("{code}: {message}")]
pub struct IdentityError {
    pub code: RpcCode,
    pub message: String,
}

impl IdentityError {
    pub fn new(code: RpcCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        self.code.is_transient()
    }
}

impl From<RpcStatus> for IdentityError {
    fn from(status: RpcStatus) -> Self {
        Self::new(status.code, status.message)
    }
}

/// Identity operations keeper-api depends on
#[async_trait]
pub trait Identity: Send + Sync {
    async fn register(&self, email: &str, password: &str) -> Result<i64, IdentityError>;

    async fn login(&self, email: &str, password: &str, app_id: i32) -> Result<String, IdentityError>;

    async fn is_admin(&self, user_id: i64) -> Result<bool, IdentityError>;
}
