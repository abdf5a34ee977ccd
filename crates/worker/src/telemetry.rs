//! Tracing and metrics initialisation.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::WorkerError;
use crate::config::{Config, LogFormat};

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level when set.
pub fn init_tracing(config: &Config) -> Result<(), WorkerError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).try_init()?,
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true),
            )
            .try_init()?,
    }

    Ok(())
}

/// Installs the Prometheus recorder with its own HTTP listener on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn install_metrics(addr: SocketAddr) -> Result<(), WorkerError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    describe_metrics();
    Ok(())
}

fn describe_metrics() {
    metrics::describe_counter!("invoices_created_total", "Invoices created");
    metrics::describe_counter!("invoices_sent_total", "Invoices sent");
    metrics::describe_counter!("invoices_paid_total", "Invoices that reached Paid");
    metrics::describe_counter!("payments_recorded_total", "Payments recorded");
    metrics::describe_counter!(
        "version_conflicts_total",
        "Commands rejected because of a stale version"
    );
    metrics::describe_counter!(
        "idempotency_hits_total",
        "Commands answered from a stored idempotency result"
    );
    metrics::describe_counter!(
        "idempotency_records_swept_total",
        "Expired idempotency records deleted by the sweeper"
    );
}
