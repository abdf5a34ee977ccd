//! Background worker for the billing core.
//!
//! Hosts the ambient runtime concerns: configuration from the environment,
//! tracing and Prometheus metrics initialisation, and the periodic sweep of
//! expired idempotency records.

pub mod config;
pub mod error;
pub mod sweeper;
pub mod telemetry;

pub use config::{Config, LogFormat};
pub use error::WorkerError;
pub use sweeper::spawn_idempotency_sweeper;
