//! freshfeed-resolver - feed resolution service
//!
//! Serves forum release posts resolved against the music catalog.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;

use freshfeed_common::config::{load_toml_config, ServiceConfig};
use freshfeed_resolver::services::{
    PipelineSettings, RedditClient, ResolutionPipeline, SpotifyClient, SqliteCacheStore,
};
use freshfeed_resolver::AppState;

/// Command-line arguments for freshfeed-resolver
#[derive(Parser, Debug)]
#[command(name = "freshfeed-resolver")]
#[command(about = "Resolves forum music releases against the catalog")]
#[command(version)]
struct Args {
    /// TOML config file (defaults to the user config directory)
    #[arg(short, long, env = "FRESHFEED_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on, overriding the config file
    #[arg(short, long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ServiceConfig::resolve(&load_toml_config(path)?)?,
        None => ServiceConfig::load()?,
    };

    freshfeed_common::logging::init_tracing(&config.log_level)?;

    info!("Starting freshfeed-resolver");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Database: {}", config.database_path.display());

    let db_pool = freshfeed_resolver::db::init_database_pool(&config.database_path)
        .await
        .context("Failed to open cache database")?;
    info!("Database connection established");

    let timeout = Duration::from_secs(config.http_timeout_secs);
    let feed = RedditClient::new(&config.feed_base_url, timeout)
        .context("Failed to build feed client")?;
    let catalog = SpotifyClient::new(&config.catalog_base_url, timeout)
        .context("Failed to build catalog client")?;

    let pipeline = ResolutionPipeline::new(
        Arc::new(feed),
        Arc::new(catalog),
        Arc::new(SqliteCacheStore::new(db_pool)),
        PipelineSettings::default(),
    );

    let state = AppState::new(Arc::new(pipeline), config.default_source.clone());
    let app = freshfeed_resolver::build_router(state);

    let addr = args.listen.unwrap_or(config.listen_addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
