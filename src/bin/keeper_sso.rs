use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use heritage_keeper::config::SsoConfig;
use heritage_keeper::database::DatabaseManager;
use heritage_keeper::sso::{self, AuthService, PgCredentialStore};
use heritage_keeper::{shutdown, telemetry};

/// keeper-sso: registration, login and token issuance
#[derive(Parser, Debug)]
#[command(name = "keeper-sso", version)]
struct Args {
    /// Path to the YAML config (falls back to CONFIG_PATH)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    let config = SsoConfig::load(args.config.as_deref()).context("failed to load config")?;

    telemetry::init(config.env);
    tracing::info!("Starting keeper-sso in {:?} mode", config.env);

    let database = DatabaseManager::connect(&config.storage)
        .await
        .context("failed to connect to database")?;
    let store = PgCredentialStore::new(database.pool().clone());
    let service = AuthService::new(Arc::new(store), config.token_ttl());

    let router = sso::router(Arc::new(service), Duration::from_secs(config.rpc.timeout_secs));

    let listener = tokio::net::TcpListener::bind(&config.rpc.address)
        .await
        .with_context(|| format!("failed to bind {}", config.rpc.address))?;
    tracing::info!(
        token_ttl_secs = config.token_ttl_secs,
        "keeper-sso listening on http://{}",
        config.rpc.address
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown::shutdown_signal())
        .await
        .context("server error")?;

    database.close().await;
    tracing::info!("keeper-sso stopped");
    Ok(())
}
