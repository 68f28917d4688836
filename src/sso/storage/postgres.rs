use async_trait::async_trait;
use sqlx::PgPool;

use super::{App, CredentialStore, CredentialStoreError, UserCredentials};
use crate::database::manager::is_unique_violation;

/// `users` / `apps` tables, see `schema/sso.sql`
#[derive(Debug, Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn save_user(&self, email: &str, pass_hash: &str) -> Result<i64, CredentialStoreError> {
        sqlx::query_scalar::<_, i64>("INSERT INTO users (email, pass_hash) VALUES ($1, $2) RETURNING id")
            .bind(email)
            .bind(pass_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    CredentialStoreError::UserExists
                } else {
                    CredentialStoreError::Sqlx(e)
                }
            })
    }

    async fn user_by_email(&self, email: &str) -> Result<UserCredentials, CredentialStoreError> {
        sqlx::query_as::<_, UserCredentials>(
            "SELECT id, email, pass_hash, is_admin FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(CredentialStoreError::UserNotFound)
    }

    async fn app(&self, app_id: i32) -> Result<App, CredentialStoreError> {
        sqlx::query_as::<_, App>("SELECT id, name, secret FROM apps WHERE id = $1")
            .bind(app_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(CredentialStoreError::AppNotFound)
    }

    async fn is_admin(&self, user_id: i64) -> Result<bool, CredentialStoreError> {
        sqlx::query_scalar::<_, bool>("SELECT is_admin FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(CredentialStoreError::UserNotFound)
    }
}
