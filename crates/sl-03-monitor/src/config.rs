//! Monitor and alert-dispatch settings.

use std::time::Duration;

/// Monitor configuration.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Time between cycles.
    pub interval: Duration,
    /// Consecutive adapter failures before a connectivity alert.
    pub failure_threshold: u32,
    /// Deadline for every adapter call.
    pub rpc_timeout: Duration,
    /// Slashed leases are still polled for events inside this window.
    pub slashing_grace_period: Duration,
    /// Warn this long before an active lease expires. Zero disables.
    pub expiry_warning: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            failure_threshold: 3,
            rpc_timeout: Duration::from_secs(10),
            slashing_grace_period: Duration::from_secs(24 * 3600),
            expiry_warning: Duration::from_secs(3600),
        }
    }
}

/// Alert delivery configuration.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Queued alerts before new ones are dropped.
    pub capacity: usize,
    /// Delivery attempts per alert, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles per retry.
    pub initial_backoff: Duration,
    /// Deadline for one delivery attempt.
    pub send_timeout: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            capacity: 256,
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            send_timeout: Duration::from_secs(10),
        }
    }
}
