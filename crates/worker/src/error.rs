//! Worker start-up errors.

use thiserror::Error;

/// Errors that can stop the worker from starting.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The tracing subscriber could not be installed.
    #[error("Failed to initialise tracing: {0}")]
    Tracing(#[from] tracing_subscriber::util::TryInitError),

    /// The Prometheus exporter could not be installed.
    #[error("Failed to install metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),
}
