use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::PgPool;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::StorageConfig;

/// Errors surfaced by the storage layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl DatabaseError {
    pub fn not_found(what: impl Into<String>) -> Self {
        DatabaseError::NotFound(what.into())
    }

    pub fn already_exists(what: impl Into<String>) -> Self {
        DatabaseError::AlreadyExists(what.into())
    }
}

/// Postgres unique_violation
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

/// Postgres foreign_key_violation
pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23503"))
}

/// Owns the connection pool for one service's database
#[derive(Debug, Clone)]
pub struct DatabaseManager {
    pool: PgPool,
}

impl DatabaseManager {
    /// Open a pool from storage settings and verify it with a ping
    pub async fn connect(config: &StorageConfig) -> Result<Self, DatabaseError> {
        let options = Self::connect_options(config)?;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await?;

        let manager = Self { pool };
        manager.health_check().await?;

        info!(
            host = %config.host,
            port = config.port,
            database = %config.db_name,
            "Connected to database"
        );
        Ok(manager)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Closed database pool");
    }

    fn connect_options(config: &StorageConfig) -> Result<PgConnectOptions, DatabaseError> {
        let ssl_mode = PgSslMode::from_str(&config.ssl_mode)
            .map_err(|_| DatabaseError::InvalidInput(format!("unknown ssl_mode '{}'", config.ssl_mode)))?;

        let mut options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .database(&config.db_name)
            .ssl_mode(ssl_mode);
        if !config.password.is_empty() {
            options = options.password(&config.password);
        }
        Ok(options)
    }
}
