//! Spesa server binary.
//!
//! Wires configuration, storage, metrics, and the HTTP router together and
//! runs until a shutdown signal arrives.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower::limit::ConcurrencyLimitLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use spesa::config::ServerConfig;
use spesa::handlers::{build_router, ListManager};
use spesa::metrics;
use spesa::middleware::track_metrics;

const DATABASE_FLUSH_TIMEOUT_SECS: u64 = 10;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    metrics::register_metrics();
    info!("Metrics registered at /metrics");

    let config = ServerConfig::from_env();

    let manager = Arc::new(ListManager::new(config.storage_path.clone(), config.clone())?);
    let manager_for_shutdown = Arc::clone(&manager);

    let cors = config.cors.to_layer();

    let app = build_router(manager)
        .layer(axum::middleware::from_fn(track_metrics))
        .layer(ConcurrencyLimitLayer::new(config.max_concurrent_requests))
        .layer(cors);

    let addr = config.bind_addr();
    info!("Server listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown signal received, flushing databases...");
    match tokio::time::timeout(
        Duration::from_secs(DATABASE_FLUSH_TIMEOUT_SECS),
        async { manager_for_shutdown.flush_all() },
    )
    .await
    {
        Ok(Ok(())) => info!("Databases flushed"),
        Ok(Err(e)) => tracing::error!("Failed to flush databases: {e}"),
        Err(_) => tracing::error!(
            "Database flush timed out after {}s",
            DATABASE_FLUSH_TIMEOUT_SECS
        ),
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Handle graceful shutdown on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
