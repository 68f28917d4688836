//! Credential persistence for keeper-sso.
use async_trait::async_trait;
use serde::Serialize;
use sqlx::FromRow;
use thiserror::Error;

pub mod memory;
pub mod postgres;

pub use memory::MemoryCredentialStore;
pub use postgres::PgCredentialStore;

/// Stored identity; `pass_hash` is an Argon2 PHC string
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    pub id: i64,
    pub email: String,
    pub pass_hash: String,
    pub is_admin: bool,
}

/// Client application allowed to request tokens
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct App {
    pub id: i32,
    pub name: String,
    #[serde(skip_serializing)]
    pub secret: String,
}

#[derive(Debug, Error)]
pub enum CredentialStoreError {
    #[error("user already exists")]
    UserExists,

    #[error("user not found")]
    UserNotFound,

    #[error("app not found")]
    AppNotFound,

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Persist a new user and return its id. Emails are unique.
    async fn save_user(&self, email: &str, pass_hash: &str) -> Result<i64, CredentialStoreError>;

    async fn user_by_email(&self, email: &str) -> Result<UserCredentials, CredentialStoreError>;

    async fn app(&self, app_id: i32) -> Result<App, CredentialStoreError>;

    async fn is_admin(&self, user_id: i64) -> Result<bool, CredentialStoreError>;
}
