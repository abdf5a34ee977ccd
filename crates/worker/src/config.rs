//! Worker configuration loaded from environment variables.

use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use domain::idempotency::DEFAULT_TTL_SECS;

const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;
const DEFAULT_METRICS_PORT: u16 = 9000;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

/// Worker configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `text` or `json` (default: `text`)
/// - `METRICS_ADDR`: Prometheus listener (default: `0.0.0.0:9000`)
/// - `IDEMPOTENCY_TTL_SECS`: idempotency record lifetime (default: 24h)
/// - `IDEMPOTENCY_SWEEP_INTERVAL_SECS`: expired-record sweep period (default: 300)
///
/// Values that fail to parse fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub log_level: String,
    pub log_format: LogFormat,
    pub metrics_addr: SocketAddr,
    pub idempotency_ttl: chrono::Duration,
    pub sweep_interval: Duration,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            log_level: lookup("RUST_LOG")
                .filter(|level| !level.trim().is_empty())
                .unwrap_or(defaults.log_level),
            log_format: parsed(&lookup, "LOG_FORMAT").unwrap_or(defaults.log_format),
            metrics_addr: parsed(&lookup, "METRICS_ADDR").unwrap_or(defaults.metrics_addr),
            idempotency_ttl: parsed::<i64>(&lookup, "IDEMPOTENCY_TTL_SECS")
                .filter(|secs| *secs > 0)
                .and_then(chrono::Duration::try_seconds)
                .unwrap_or(defaults.idempotency_ttl),
            sweep_interval: parsed::<u64>(&lookup, "IDEMPOTENCY_SWEEP_INTERVAL_SECS")
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.sweep_interval),
        }
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|value| value.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            metrics_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_METRICS_PORT)),
            idempotency_ttl: chrono::Duration::seconds(DEFAULT_TTL_SECS),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
        }
    }
}
