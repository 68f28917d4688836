use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::storage::{CredentialStore, CredentialStoreError};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::{issue_token, Claims};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("user already exists")]
    UserExists,

    #[error("user not found")]
    UserNotFound,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("invalid app id")]
    InvalidApp,

    #[error("internal error")]
    Internal(String),
}

impl From<CredentialStoreError> for AuthError {
    fn from(err: CredentialStoreError) -> Self {
        match err {
            CredentialStoreError::UserExists => AuthError::UserExists,
            CredentialStoreError::UserNotFound => AuthError::UserNotFound,
            CredentialStoreError::AppNotFound => AuthError::InvalidApp,
            CredentialStoreError::Sqlx(e) => {
                error!("credential store error: {}", e);
                AuthError::Internal(e.to_string())
            }
        }
    }
}

/// Credential checks and token issuance
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    token_ttl: Duration,
}

impl AuthService {
    pub fn new(store: Arc<dyn CredentialStore>, token_ttl: Duration) -> Self {
        Self { store, token_ttl }
    }

    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<i64, AuthError> {
        require("email", email)?;
        require("password", password)?;

        let pass_hash = hash_password(password).map_err(|e| {
            error!("{}", e);
            AuthError::Internal(e)
        })?;

        let user_id = self.store.save_user(email, &pass_hash).await.map_err(|e| {
            if matches!(e, CredentialStoreError::UserExists) {
                warn!(email, "registration rejected: user already exists");
            }
            AuthError::from(e)
        })?;

        info!(user_id, "user registered");
        Ok(user_id)
    }

    /// Verify credentials and mint a token signed with the app's secret
    pub async fn login(&self, email: &str, password: &str, app_id: i32) -> Result<String, AuthError> {
        require("email", email)?;
        require("password", password)?;
        if app_id == 0 {
            return Err(AuthError::InvalidArgument("app_id is required".to_string()));
        }

        let user = self.store.user_by_email(email).await?;
        if !verify_password(password, &user.pass_hash) {
            debug!(user_id = user.id, "login rejected: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let app = self.store.app(app_id).await?;
        let claims = Claims::new(user.id, user.email, app.id, self.token_ttl);
        let token = issue_token(&claims, &app.secret).map_err(|e| {
            error!(app_id, "failed to issue token: {}", e);
            AuthError::Internal(e.to_string())
        })?;

        info!(user_id = user.id, app_id, "user logged in");
        Ok(token)
    }

    pub async fn is_admin(&self, user_id: i64) -> Result<bool, AuthError> {
        if user_id <= 0 {
            return Err(AuthError::InvalidArgument("user_id is required".to_string()));
        }
        let is_admin = self.store.is_admin(user_id).await?;
        debug!(user_id, is_admin, "checked admin flag");
        Ok(is_admin)
    }
}

fn require(field: &str, value: &str) -> Result<(), AuthError> {
    if value.trim().is_empty() {
        return Err(AuthError::InvalidArgument(format!("{} is required", field)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verify_token;
    use crate::sso::storage::MemoryCredentialStore;
    use chrono::Utc;

    const SECRET: &str = "app-secret";

    fn service() -> AuthService {
        let store = MemoryCredentialStore::with_app(1, "keeper", SECRET);
        AuthService::new(Arc::new(store), Duration::from_secs(3600))
    }

    #[tokio::test]
    async fn register_then_login_issues_token_for_user() {
        let service = service();
        let user_id = service.register("ann@example.com", "pw123456").await.unwrap();

        let login_time = Utc::now().timestamp();
        let token = service.login("ann@example.com", "pw123456", 1).await.unwrap();
        let claims = verify_token(&token, SECRET).unwrap();

        assert_eq!(claims.uid, user_id);
        assert_eq!(claims.email, "ann@example.com");
        assert_eq!(claims.app_id, 1);
        assert!((claims.exp - (login_time + 3600)).abs() <= 1);
    }

    #[tokio::test]
    async fn duplicate_registration_fails() {
        let service = service();
        service.register("ann@example.com", "pw").await.unwrap();
        let err = service.register("ann@example.com", "pw").await.unwrap_err();
        assert!(matches!(err, AuthError::UserExists));
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_credentials() {
        let service = service();
        service.register("ann@example.com", "right").await.unwrap();
        let err = service.login("ann@example.com", "wrong", 1).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn login_validates_inputs() {
        let service = service();
        service.register("ann@example.com", "pw").await.unwrap();

        assert!(matches!(service.login("", "pw", 1).await, Err(AuthError::InvalidArgument(_))));
        assert!(matches!(service.login("ann@example.com", "", 1).await, Err(AuthError::InvalidArgument(_))));
        assert!(matches!(service.login("ann@example.com", "pw", 0).await, Err(AuthError::InvalidArgument(_))));
        assert!(matches!(service.login("ann@example.com", "pw", 9).await, Err(AuthError::InvalidApp)));
        assert!(matches!(service.login("bob@example.com", "pw", 1).await, Err(AuthError::UserNotFound)));
    }

    #[tokio::test]
    async fn register_requires_fields() {
        let service = service();
        assert!(matches!(service.register(" ", "pw").await, Err(AuthError::InvalidArgument(_))));
        assert!(matches!(service.register("a@b.c", "").await, Err(AuthError::InvalidArgument(_))));
    }
}
