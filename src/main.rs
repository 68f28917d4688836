use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use heritage_keeper::app::{self, AppState, RouterOptions};
use heritage_keeper::config::KeeperConfig;
use heritage_keeper::database::{DatabaseManager, PgStore};
use heritage_keeper::identity::IdentityClient;
use heritage_keeper::services::KeeperService;
use heritage_keeper::{shutdown, telemetry};

/// keeper-api: collections, items and profiles over HTTP
#[derive(Parser, Debug)]
#[command(name = "keeper-api", version)]
struct Args {
    /// Path to the YAML config (falls back to CONFIG_PATH)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so local runs pick up CONFIG_PATH, STORAGE_*, etc.
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    let config = KeeperConfig::load(args.config.as_deref()).context("failed to load config")?;

    telemetry::init(config.env);
    tracing::info!("Starting keeper-api in {:?} mode", config.env);

    let database = DatabaseManager::connect(&config.storage)
        .await
        .context("failed to connect to database")?;
    let store = Arc::new(PgStore::new(database.pool().clone()));

    let identity = IdentityClient::new(&config.clients.sso).context("failed to build identity client")?;
    tracing::info!(
        address = %config.clients.sso.address,
        retries = config.clients.sso.retries_count,
        "identity client ready"
    );

    let state = AppState::new(
        KeeperService::new(store),
        Arc::new(identity),
        config.app_id,
        &config.app_secret,
    )
    .with_database(database.clone());
    let router = app::router(state, &RouterOptions::from(&config));

    let listener = tokio::net::TcpListener::bind(&config.http_server.address)
        .await
        .with_context(|| format!("failed to bind {}", config.http_server.address))?;
    tracing::info!("keeper-api listening on http://{}", config.http_server.address);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown::shutdown_signal())
        .await
        .context("server error")?;

    database.close().await;
    tracing::info!("keeper-api stopped");
    Ok(())
}
