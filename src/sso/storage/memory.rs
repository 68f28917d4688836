use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{App, CredentialStore, CredentialStoreError, UserCredentials};

#[derive(Debug, Default)]
struct Tables {
    users: Vec<UserCredentials>,
    apps: HashMap<i32, App>,
    next_user_id: i64,
}

/// In-process credential store for tests and local runs
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    tables: RwLock<Tables>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with one application
    pub fn with_app(id: i32, name: impl Into<String>, secret: impl Into<String>) -> Self {
        let mut tables = Tables::default();
        tables.apps.insert(
            id,
            App {
                id,
                name: name.into(),
                secret: secret.into(),
            },
        );
        Self {
            tables: RwLock::new(tables),
        }
    }

    pub async fn set_admin(&self, user_id: i64, is_admin: bool) -> Result<(), CredentialStoreError> {
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(CredentialStoreError::UserNotFound)?;
        user.is_admin = is_admin;
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn save_user(&self, email: &str, pass_hash: &str) -> Result<i64, CredentialStoreError> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.email == email) {
            return Err(CredentialStoreError::UserExists);
        }
        tables.next_user_id += 1;
        let id = tables.next_user_id;
        tables.users.push(UserCredentials {
            id,
            email: email.to_string(),
            pass_hash: pass_hash.to_string(),
            is_admin: false,
        });
        Ok(id)
    }

    async fn user_by_email(&self, email: &str) -> Result<UserCredentials, CredentialStoreError> {
        let tables = self.tables.read().await;
        tables
            .users
            .iter()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(CredentialStoreError::UserNotFound)
    }

    async fn app(&self, app_id: i32) -> Result<App, CredentialStoreError> {
        let tables = self.tables.read().await;
        tables
            .apps
            .get(&app_id)
            .cloned()
            .ok_or(CredentialStoreError::AppNotFound)
    }

    async fn is_admin(&self, user_id: i64) -> Result<bool, CredentialStoreError> {
        let tables = self.tables.read().await;
        tables
            .users
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| u.is_admin)
            .ok_or(CredentialStoreError::UserNotFound)
    }
}
