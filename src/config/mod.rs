use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config path is empty (pass --config or set CONFIG_PATH)")]
    MissingPath,

    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Deployment profile; drives logging format and verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Dev,
    Prod,
}

impl Environment {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "local" => Some(Environment::Local),
            "dev" | "development" => Some(Environment::Dev),
            "prod" | "production" => Some(Environment::Prod),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub db_name: String,
    pub ssl_mode: String,
    pub max_connections: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: String::new(),
            db_name: "heritage_keeper".to_string(),
            ssl_mode: "disable".to_string(),
            max_connections: 10,
        }
    }
}

impl StorageConfig {
    fn apply_env(&mut self) {
        override_from_env("STORAGE_HOST", &mut self.host);
        override_from_env("STORAGE_PORT", &mut self.port);
        override_from_env("STORAGE_USER", &mut self.user);
        override_from_env("STORAGE_PASSWORD", &mut self.password);
        override_from_env("STORAGE_DB_NAME", &mut self.db_name);
        override_from_env("STORAGE_SSL_MODE", &mut self.ssl_mode);
        override_from_env("STORAGE_MAX_CONNECTIONS", &mut self.max_connections);
    }
}

/// Listener settings for the identity service RPC endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcServerConfig {
    pub address: String,
    pub timeout_secs: u64,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:44044".to_string(),
            timeout_secs: 10,
        }
    }
}

/// keeper-sso configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SsoConfig {
    #[serde(default)]
    pub env: Environment,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub rpc: RpcServerConfig,
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
}

const MAX_TOKEN_TTL_SECS: u64 = 365 * 24 * 60 * 60;

fn default_token_ttl_secs() -> u64 {
    3600
}

impl Default for SsoConfig {
    fn default() -> Self {
        Self {
            env: Environment::default(),
            storage: StorageConfig::default(),
            rpc: RpcServerConfig::default(),
            token_ttl_secs: default_token_ttl_secs(),
        }
    }
}

impl SsoConfig {
    pub fn load(cli_path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = resolve_path(cli_path)?;
        Self::from_path(&path)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let config: Self = read_yaml(path)?;
        config.with_env_overrides().validated()
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }

    fn with_env_overrides(mut self) -> Self {
        override_env_profile(&mut self.env);
        self.storage.apply_env();
        override_from_env("RPC_ADDRESS", &mut self.rpc.address);
        override_from_env("TOKEN_TTL_SECS", &mut self.token_ttl_secs);
        self
    }

    fn validated(self) -> Result<Self, ConfigError> {
        if self.token_ttl_secs == 0 {
            return Err(ConfigError::Invalid("token_ttl_secs must be positive".to_string()));
        }
        if self.token_ttl_secs > MAX_TOKEN_TTL_SECS {
            return Err(ConfigError::Invalid(format!(
                "token_ttl_secs must be at most {} (one year)",
                MAX_TOKEN_TTL_SECS
            )));
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpServerConfig {
    pub address: String,
    pub timeout_secs: u64,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0:8080".to_string(),
            timeout_secs: 5,
        }
    }
}

/// Connection settings for the identity service client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SsoClientConfig {
    /// Base URL of keeper-sso, e.g. `http://127.0.0.1:44044`
    pub address: String,
    /// Per-attempt timeout
    pub timeout_ms: u64,
    pub retries_count: u32,
}

impl Default for SsoClientConfig {
    fn default() -> Self {
        Self {
            address: "http://127.0.0.1:44044".to_string(),
            timeout_ms: 5000,
            retries_count: 3,
        }
    }
}

impl SsoClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientsConfig {
    pub sso: SsoClientConfig,
}

/// keeper-api configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeeperConfig {
    #[serde(default)]
    pub env: Environment,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub http_server: HttpServerConfig,
    #[serde(default)]
    pub clients: ClientsConfig,
    /// Application id this service logs users into
    pub app_id: i32,
    /// Secret shared with keeper-sso for `app_id`; verifies bearer tokens
    pub app_secret: String,
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl KeeperConfig {
    pub fn load(cli_path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = resolve_path(cli_path)?;
        Self::from_path(&path)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let config: Self = read_yaml(path)?;
        config.with_env_overrides().validated()
    }

    fn with_env_overrides(mut self) -> Self {
        override_env_profile(&mut self.env);
        self.storage.apply_env();
        override_from_env("HTTP_SERVER_ADDRESS", &mut self.http_server.address);
        override_from_env("HTTP_SERVER_TIMEOUT_SECS", &mut self.http_server.timeout_secs);
        override_from_env("SSO_ADDRESS", &mut self.clients.sso.address);
        override_from_env("SSO_TIMEOUT_MS", &mut self.clients.sso.timeout_ms);
        override_from_env("SSO_RETRIES_COUNT", &mut self.clients.sso.retries_count);
        override_from_env("APP_ID", &mut self.app_id);
        override_from_env("APP_SECRET", &mut self.app_secret);
        if let Ok(v) = env::var("CORS_ORIGINS") {
            self.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        self
    }

    fn validated(self) -> Result<Self, ConfigError> {
        if self.app_secret.is_empty() {
            return Err(ConfigError::Invalid("app_secret is required".to_string()));
        }
        if self.app_id <= 0 {
            return Err(ConfigError::Invalid("app_id must be positive".to_string()));
        }
        if self.clients.sso.retries_count == 0 {
            return Err(ConfigError::Invalid("clients.sso.retries_count must be at least 1".to_string()));
        }
        Ok(self)
    }
}

/// `--config` wins over `CONFIG_PATH`
fn resolve_path(cli_path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = cli_path {
        return Ok(path.to_path_buf());
    }
    match env::var("CONFIG_PATH") {
        Ok(v) if !v.trim().is_empty() => Ok(PathBuf::from(v)),
        _ => Err(ConfigError::MissingPath),
    }
}

fn read_yaml<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn override_env_profile(target: &mut Environment) {
    if let Some(env) = env::var("APP_ENV").ok().as_deref().and_then(Environment::parse) {
        *target = env;
    }
}

fn override_from_env<T: std::str::FromStr>(key: &str, target: &mut T) {
    if let Some(v) = env::var(key).ok().and_then(|v| v.parse().ok()) {
        *target = v;
    }
}
