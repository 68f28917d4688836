use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Environment;

/// Install the global tracing subscriber for the given profile.
///
/// `local` logs human-readable debug output, `dev` logs JSON at debug, and
/// `prod` logs human-readable info. `RUST_LOG` takes precedence when set.
pub fn init(env: Environment) {
    let default_level = match env {
        Environment::Local | Environment::Dev => "debug",
        Environment::Prod => "info",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let result = match env {
        Environment::Dev => fmt().json().with_env_filter(filter).try_init(),
        Environment::Local | Environment::Prod => fmt().with_env_filter(filter).try_init(),
    };

    if let Err(e) = result {
        tracing::warn!("tracing subscriber already installed: {}", e);
    }
}
