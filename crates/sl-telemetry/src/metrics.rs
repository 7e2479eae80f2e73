//! Prometheus metrics for the validator node.
//!
//! All metrics follow the naming convention: `sl_<area>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., lease transitions)
//! - **Gauge**: Value that can go up or down (e.g., leases per status)
//! - **Histogram**: Distribution of values (e.g., cycle duration)

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, CounterVec, Encoder, Gauge, GaugeVec, Histogram, HistogramOpts,
    HistogramVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // LEASE STATE
    // =========================================================================

    /// Leases currently held, by status
    pub static ref LEASES_BY_STATUS: GaugeVec = GaugeVec::new(
        Opts::new("sl_leases", "Number of leases in the store by status"),
        &["status"]
    ).expect("metric creation failed");

    /// Applied lifecycle transitions
    pub static ref LEASE_TRANSITIONS: CounterVec = CounterVec::new(
        Opts::new("sl_lease_transitions_total", "Lease status transitions applied"),
        &["from", "to"]
    ).expect("metric creation failed");

    /// Stake committed to active and slashed leases
    pub static ref STAKE_COMMITTED: Gauge = Gauge::new(
        "sl_stake_committed",
        "Stake committed to active and slashed leases"
    ).expect("metric creation failed");

    /// Validator stake balance last reported by the main chain
    pub static ref STAKE_BALANCE: Gauge = Gauge::new(
        "sl_stake_balance",
        "Validator stake balance reported by the main chain"
    ).expect("metric creation failed");

    // =========================================================================
    // POLLING CYCLES
    // =========================================================================

    /// Completed polling cycles
    pub static ref CYCLES: CounterVec = CounterVec::new(
        Opts::new("sl_cycles_total", "Polling cycles by task and outcome"),
        &["task", "outcome"]  // task: manager/monitor, outcome: ok/degraded
    ).expect("metric creation failed");

    /// Cycle duration histogram
    pub static ref CYCLE_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "sl_cycle_duration_seconds",
            "Time spent in one polling cycle"
        ).buckets(exponential_buckets(0.001, 2.0, 15).expect("valid buckets")),
        &["task"]
    ).expect("metric creation failed");

    // =========================================================================
    // REMOTE CALLS
    // =========================================================================

    /// Remote RPC calls
    pub static ref RPC_CALLS: CounterVec = CounterVec::new(
        Opts::new("sl_rpc_calls_total", "Remote RPC calls by method and outcome"),
        &["method", "outcome"]  // outcome: ok/error/timeout
    ).expect("metric creation failed");

    /// Remote RPC latency
    pub static ref RPC_LATENCY: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "sl_rpc_latency_seconds",
            "Latency of remote RPC calls"
        ).buckets(exponential_buckets(0.001, 2.0, 14).expect("valid buckets"))
    ).expect("metric creation failed");

    // =========================================================================
    // ALERTS
    // =========================================================================

    /// Alerts raised, by kind
    pub static ref ALERTS_RAISED: CounterVec = CounterVec::new(
        Opts::new("sl_alerts_raised_total", "Alerts raised by kind"),
        &["kind"]
    ).expect("metric creation failed");

    /// Alert delivery attempts
    pub static ref ALERT_DELIVERIES: CounterVec = CounterVec::new(
        Opts::new("sl_alert_deliveries_total", "Alert delivery outcomes"),
        &["outcome"]  // outcome: delivered/retried/failed/dropped
    ).expect("metric creation failed");
}

/// Handle to the registered metrics
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
///
/// Safe to call more than once; already-registered collectors are skipped.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Lease state
        Box::new(LEASES_BY_STATUS.clone()),
        Box::new(LEASE_TRANSITIONS.clone()),
        Box::new(STAKE_COMMITTED.clone()),
        Box::new(STAKE_BALANCE.clone()),
        // Cycles
        Box::new(CYCLES.clone()),
        Box::new(CYCLE_DURATION.clone()),
        // Remote calls
        Box::new(RPC_CALLS.clone()),
        Box::new(RPC_LATENCY.clone()),
        // Alerts
        Box::new(ALERTS_RAISED.clone()),
        Box::new(ALERT_DELIVERIES.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Record one applied lease transition.
pub fn record_transition(from: &str, to: &str) {
    LEASE_TRANSITIONS.with_label_values(&[from, to]).inc();
}

/// Record the outcome of one remote call.
pub fn record_rpc(method: &str, outcome: &str, seconds: f64) {
    RPC_CALLS.with_label_values(&[method, outcome]).inc();
    RPC_LATENCY.observe(seconds);
}

/// Replace the per-status lease gauges.
pub fn set_lease_counts<'a>(counts: impl IntoIterator<Item = (&'a str, usize)>) {
    for (status, count) in counts {
        LEASES_BY_STATUS.with_label_values(&[status]).set(count as f64);
    }
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}
