//! # SL Telemetry
//!
//! Structured logging and Prometheus metrics for the validator node.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sl_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let _guard = init_telemetry(TelemetryConfig::from_env())?;
//!     // Lease manager and monitor log and record metrics from here on
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SL_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `SL_JSON_LOGS` | `false` (`true` in containers) | JSON log lines |
//! | `SL_CONSOLE_OUTPUT` | `true` | Emit logs to stdout |
//! | `SL_SERVICE_NAME` | `security-leasing` | Service name in logs |

#![warn(missing_docs)]

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{encode_metrics, register_metrics, MetricsHandle};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// Subscriber could not be installed.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// Metric registration or encoding failed.
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    /// Bad telemetry settings.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and register metrics.
///
/// The returned guard must be held for the lifetime of the process.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics = register_metrics()?;
    init_logging(&config)?;

    tracing::info!(
        service = %config.service_name,
        log_level = %config.log_level,
        json_logs = config.json_logs,
        "Telemetry initialized"
    );

    Ok(TelemetryGuard { _metrics: metrics })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}

/// Log a lease-scoped event with the standard fields.
///
/// ```rust,ignore
/// log_lease_event!(info, "lease-manager", "Lease activated", lease.lease_id, lease.subnet_id);
/// ```
#[macro_export]
macro_rules! log_lease_event {
    ($level:ident, $component:expr, $msg:expr, $lease_id:expr, $subnet_id:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = $component,
            lease_id = %$lease_id,
            subnet_id = %$subnet_id,
            $($($field)*,)?
            $msg
        )
    };
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "security-leasing");
    }

    #[test]
    fn test_log_lease_event_expands() {
        let lease_id = "lease-1";
        let subnet_id = "subnet-a";
        log_lease_event!(info, "test", "Lease touched", lease_id, subnet_id, stake = 10u64);
        log_lease_event!(debug, "test", "Lease touched", lease_id, subnet_id);
    }
}
