// Sales Report - Web Server
// REST API with Axum over the SQLite record store

use anyhow::{Context, Result};
use clap::Parser;
use sales_report::api::{router, AppState};
use sales_report::config::ServerConfig;
use sales_report::{telemetry, FilterSpec, RecordStore, SqliteStore};

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init();
    let config = ServerConfig::parse();

    if !config.db.exists() {
        tracing::error!(db = %config.db.display(), "database not found; run `sales-report import <file>` first");
        std::process::exit(1);
    }

    let store = SqliteStore::open(&config.db)
        .with_context(|| format!("Failed to open database {}", config.db.display()))?;
    let records = store.count(&FilterSpec::default())?;
    tracing::info!(db = %config.db.display(), records, "database opened");

    let app = router(AppState::new(store));

    let listener = tokio::net::TcpListener::bind(&config.addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.addr))?;
    tracing::info!(addr = %config.addr, "server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
