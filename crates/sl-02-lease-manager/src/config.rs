//! Lease manager settings.

use shared_types::ValidatorAddress;
use std::time::Duration;

/// Lease manager configuration.
#[derive(Debug, Clone)]
pub struct LeaseManagerConfig {
    /// Address whose leases are reconciled.
    pub validator_address: ValidatorAddress,
    /// Time between cycles.
    pub interval: Duration,
    /// Promote pending leases automatically.
    pub auto_activate: bool,
    /// Lease term when the descriptor carries none.
    pub default_lease_duration: Duration,
    /// Time a slashed lease waits without further slashing before termination.
    pub slashing_grace_period: Duration,
    /// Consecutive activation failures before the standing alert.
    pub activation_retry_limit: u32,
    /// Pending age that raises a standing alert.
    pub pending_alert_after: Duration,
    /// Deadline for every remote call.
    pub rpc_timeout: Duration,
}

impl LeaseManagerConfig {
    /// Defaults for `address`.
    pub fn for_validator(address: impl Into<ValidatorAddress>) -> Self {
        Self {
            validator_address: address.into(),
            ..Self::default()
        }
    }
}

impl Default for LeaseManagerConfig {
    fn default() -> Self {
        Self {
            validator_address: ValidatorAddress::new(""),
            interval: Duration::from_secs(30),
            auto_activate: true,
            default_lease_duration: Duration::from_secs(720 * 3600),
            slashing_grace_period: Duration::from_secs(24 * 3600),
            activation_retry_limit: 3,
            pending_alert_after: Duration::from_secs(3600),
            rpc_timeout: Duration::from_secs(10),
        }
    }
}
