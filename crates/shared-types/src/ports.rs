//! # Capability Ports
//!
//! Abstract interfaces to the node's remote collaborators. Subsystems depend
//! on these traits only; the node runtime wires in JSON-RPC and webhook
//! adapters, tests wire in the mocks from `test_utils`.

use crate::alerts::Alert;
use crate::entities::{LeaseDescriptor, LeaseHealth, LeaseId, SlashingEvent, SubnetId, Timestamp, ValidatorAddress};
use crate::errors::{AlertError, RpcError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// RPC boundary to the main chain.
#[async_trait]
pub trait MainChainClient: Send + Sync {
    /// Leases currently assigned to `address` and not yet activated.
    async fn fetch_pending_leases(
        &self,
        address: &ValidatorAddress,
    ) -> Result<Vec<LeaseDescriptor>, RpcError>;

    /// Bonded stake of `address`.
    async fn fetch_stake_balance(&self, address: &ValidatorAddress) -> Result<u64, RpcError>;
}

/// Per-subnet RPC boundary. One instance per configured subnet.
#[async_trait]
pub trait SubnetAdapterClient: Send + Sync {
    /// Subnet-side view of the lease.
    async fn fetch_lease_status(&self, lease_id: &LeaseId) -> Result<LeaseHealth, RpcError>;

    /// Slashing events recorded at or after `since`.
    ///
    /// The bound is inclusive because timestamps are whole seconds; callers
    /// deduplicate by `SlashingEvent::reference`.
    async fn fetch_slashing_events(
        &self,
        lease_id: &LeaseId,
        since: Timestamp,
    ) -> Result<Vec<SlashingEvent>, RpcError>;

    /// Activate the lease on the subnet.
    async fn activate_lease(&self, lease_id: &LeaseId) -> Result<(), RpcError>;
}

/// Adapter clients keyed by subnet. Clients are stateless handles.
pub type SubnetAdapters = HashMap<SubnetId, Arc<dyn SubnetAdapterClient>>;

/// Delivers alert payloads (webhook, log, ...).
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Deliver one alert. A single attempt; retries belong to the caller.
    async fn send(&self, alert: &Alert) -> Result<(), AlertError>;
}

/// Non-blocking alert hand-off used inside the polling loops.
///
/// Implementations must return immediately; delivery happens elsewhere.
pub trait AlertPublisher: Send + Sync {
    /// Queue an alert for delivery.
    fn publish(&self, alert: Alert);
}

/// Abstract interface for time.
///
/// Enables deterministic testing by injecting controllable time sources.
pub trait TimeSource: Send + Sync {
    /// Get the current timestamp.
    fn now(&self) -> Timestamp;
}

/// Wall-clock time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Timestamp::new(secs)
    }
}

/// Run a remote call with a deadline. Elapsed deadlines become `RpcError::Timeout`.
pub async fn with_timeout<T, F>(operation: &'static str, limit: Duration, call: F) -> Result<T, RpcError>
where
    F: Future<Output = Result<T, RpcError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(RpcError::Timeout {
            operation,
            after_ms: limit.as_millis() as u64,
        }),
    }
}
