//! castq Queue Service (castq-qs) - Main entry point
//!
//! Serves per-feed enqueue preferences, the global enqueue default and the
//! playback queue over HTTP.

use std::path::PathBuf;

use anyhow::{Context, Result};
use castq_common::config::TomlConfig;
use castq_common::db::init_database;
use castq_qs::api::{create_router, AppContext};
use castq_qs::config::Config;
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for castq-qs
#[derive(Parser, Debug)]
#[command(name = "castq-qs")]
#[command(about = "Queue service for castq")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5750", env = "CASTQ_QS_PORT")]
    port: u16,

    /// Root folder holding the database
    #[arg(short, long)]
    root_folder: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let toml_config = TomlConfig::load_or_default();
    let config = Config::resolve(args.root_folder.as_deref(), args.port, &toml_config);

    let default_filter = config
        .log_level
        .as_deref()
        .map(|level| format!("castq_qs={},tower_http={}", level, level))
        .unwrap_or_else(|| "castq_qs=debug,tower_http=debug".to_string());

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting castq Queue Service on port {}", args.port);
    info!("Root folder: {}", config.root_folder.display());

    let db_pool = init_database(&config.db_path, config.initial_enqueue_location)
        .await
        .with_context(|| format!("Failed to open database {}", config.db_path.display()))?;

    let app = create_router(AppContext::new(db_pool.clone()));

    info!("Starting HTTP server on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    db_pool.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
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
