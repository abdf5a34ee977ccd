//! Worker entry point.

use std::sync::Arc;

use common::SystemClock;
use domain::IdempotencyGuard;
use store::InMemoryIdempotencyStore;
use tokio::signal;
use tokio::sync::watch;
use worker::{Config, spawn_idempotency_sweeper, telemetry};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), worker::WorkerError> {
    let config = Config::from_env();

    telemetry::init_tracing(&config)?;
    telemetry::install_metrics(config.metrics_addr)?;
    tracing::info!(metrics_addr = %config.metrics_addr, "metrics exporter listening");

    let guard = Arc::new(
        IdempotencyGuard::new(InMemoryIdempotencyStore::new(), SystemClock)
            .with_ttl(config.idempotency_ttl),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = spawn_idempotency_sweeper(guard, config.sweep_interval, shutdown_rx);

    shutdown_signal().await;

    // The receiver may already be gone if the sweeper task panicked.
    let _ = shutdown_tx.send(true);
    if let Err(e) = sweeper.await {
        tracing::error!(error = %e, "idempotency sweeper task failed");
    }

    tracing::info!("worker shut down gracefully");
    Ok(())
}
