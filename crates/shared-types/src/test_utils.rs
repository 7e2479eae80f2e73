//! Test utilities: controllable clock and in-memory mock ports.
//!
//! Enabled for downstream crates through the `test-utils` feature.

use crate::alerts::{Alert, AlertKind};
use crate::entities::{LeaseDescriptor, LeaseHealth, LeaseId, SlashingEvent, SubnetId, Timestamp, ValidatorAddress};
use crate::errors::{AlertError, RpcError};
use crate::ports::{AlertPublisher, AlertSink, MainChainClient, SubnetAdapterClient, TimeSource};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// Build a descriptor with no explicit duration.
pub fn descriptor(lease_id: &str, subnet_id: &str, stake: u64) -> LeaseDescriptor {
    LeaseDescriptor {
        lease_id: LeaseId::new(lease_id),
        subnet_id: SubnetId::new(subnet_id),
        stake,
        duration_secs: None,
    }
}

/// Build a slashing event.
pub fn slashing_event(reference: &str, lease_id: &str, amount: u64, occurred_at: u64) -> SlashingEvent {
    SlashingEvent {
        reference: reference.to_string(),
        lease_id: LeaseId::new(lease_id),
        amount,
        occurred_at: Timestamp::new(occurred_at),
        reason: None,
    }
}

/// Time source whose value is set explicitly by the test.
#[derive(Debug, Default)]
pub struct ManualTimeSource {
    secs: AtomicU64,
}

impl ManualTimeSource {
    /// Start at `secs`.
    pub fn new(secs: u64) -> Self {
        Self {
            secs: AtomicU64::new(secs),
        }
    }

    /// Jump to `secs`.
    pub fn set(&self, secs: u64) {
        self.secs.store(secs, Ordering::SeqCst);
    }

    /// Move forward by `secs`.
    pub fn advance(&self, secs: u64) {
        self.secs.fetch_add(secs, Ordering::SeqCst);
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> Timestamp {
        Timestamp::new(self.secs.load(Ordering::SeqCst))
    }
}

// =============================================================================
// MAIN CHAIN
// =============================================================================

struct MainChainState {
    pending: Vec<LeaseDescriptor>,
    balance: u64,
    error: Option<RpcError>,
    balance_error: Option<RpcError>,
    pending_calls: u32,
}

/// In-memory main chain.
pub struct MockMainChain {
    state: Mutex<MainChainState>,
}

impl Default for MockMainChain {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMainChain {
    /// No pending leases, unlimited balance.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MainChainState {
                pending: Vec::new(),
                balance: u64::MAX,
                error: None,
                balance_error: None,
                pending_calls: 0,
            }),
        }
    }

    /// Start with the given pending set.
    pub fn with_pending(pending: Vec<LeaseDescriptor>) -> Self {
        let chain = Self::new();
        chain.set_pending(pending);
        chain
    }

    /// Replace the pending set.
    pub fn set_pending(&self, pending: Vec<LeaseDescriptor>) {
        self.state.lock().pending = pending;
    }

    /// Drop a lease from the pending set.
    pub fn retract(&self, lease_id: &str) {
        self.state.lock().pending.retain(|d| d.lease_id.as_str() != lease_id);
    }

    /// Update the stake reported for a pending lease.
    pub fn top_up(&self, lease_id: &str, stake: u64) {
        let mut state = self.state.lock();
        for desc in state.pending.iter_mut().filter(|d| d.lease_id.as_str() == lease_id) {
            desc.stake = stake;
        }
    }

    /// Set the bonded balance.
    pub fn set_balance(&self, balance: u64) {
        self.state.lock().balance = balance;
    }

    /// Make `fetch_pending_leases` fail (or succeed again with `None`).
    pub fn fail_with(&self, error: Option<RpcError>) {
        self.state.lock().error = error;
    }

    /// Make `fetch_stake_balance` fail (or succeed again with `None`).
    pub fn fail_balance_with(&self, error: Option<RpcError>) {
        self.state.lock().balance_error = error;
    }

    /// Number of `fetch_pending_leases` calls.
    pub fn pending_calls(&self) -> u32 {
        self.state.lock().pending_calls
    }
}

#[async_trait]
impl MainChainClient for MockMainChain {
    async fn fetch_pending_leases(&self, _address: &ValidatorAddress) -> Result<Vec<LeaseDescriptor>, RpcError> {
        let mut state = self.state.lock();
        state.pending_calls += 1;
        match &state.error {
            Some(err) => Err(err.clone()),
            None => Ok(state.pending.clone()),
        }
    }

    async fn fetch_stake_balance(&self, _address: &ValidatorAddress) -> Result<u64, RpcError> {
        let state = self.state.lock();
        match &state.balance_error {
            Some(err) => Err(err.clone()),
            None => Ok(state.balance),
        }
    }
}

// =============================================================================
// SUBNET ADAPTER
// =============================================================================

#[derive(Default)]
struct AdapterState {
    inactive: HashSet<LeaseId>,
    events: Vec<SlashingEvent>,
    status_error: Option<RpcError>,
    events_error: Option<RpcError>,
    failing_activations: HashSet<LeaseId>,
    activated: Vec<LeaseId>,
    activation_attempts: u32,
    status_calls: u32,
    event_queries: Vec<(LeaseId, Timestamp)>,
    hang: bool,
}

/// In-memory subnet adapter. Every lease is healthy unless marked otherwise.
#[derive(Default)]
pub struct MockSubnetAdapter {
    state: Mutex<AdapterState>,
}

impl MockSubnetAdapter {
    /// Healthy adapter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `lease_id` as inactive on the subnet.
    pub fn mark_inactive(&self, lease_id: &str) {
        self.state.lock().inactive.insert(LeaseId::new(lease_id));
    }

    /// Record a slashing event on the subnet.
    pub fn push_event(&self, event: SlashingEvent) {
        self.state.lock().events.push(event);
    }

    /// Make `fetch_lease_status` fail (or succeed again with `None`).
    pub fn fail_status_with(&self, error: Option<RpcError>) {
        self.state.lock().status_error = error;
    }

    /// Make `fetch_slashing_events` fail (or succeed again with `None`).
    pub fn fail_events_with(&self, error: Option<RpcError>) {
        self.state.lock().events_error = error;
    }

    /// Make `activate_lease` fail for `lease_id`.
    pub fn fail_activation(&self, lease_id: &str) {
        self.state.lock().failing_activations.insert(LeaseId::new(lease_id));
    }

    /// Let `activate_lease` succeed for `lease_id` again.
    pub fn heal_activation(&self, lease_id: &str) {
        self.state.lock().failing_activations.remove(&LeaseId::new(lease_id));
    }

    /// Never answer any call.
    pub fn hang(&self, hang: bool) {
        self.state.lock().hang = hang;
    }

    /// Leases successfully activated, in call order.
    pub fn activated(&self) -> Vec<LeaseId> {
        self.state.lock().activated.clone()
    }

    /// Total `activate_lease` calls, successful or not.
    pub fn activation_attempts(&self) -> u32 {
        self.state.lock().activation_attempts
    }

    /// Number of `fetch_lease_status` calls.
    pub fn status_calls(&self) -> u32 {
        self.state.lock().status_calls
    }

    /// `(lease, since)` pairs passed to `fetch_slashing_events`.
    pub fn event_queries(&self) -> Vec<(LeaseId, Timestamp)> {
        self.state.lock().event_queries.clone()
    }

    async fn maybe_hang(&self) {
        let hang = self.state.lock().hang;
        if hang {
            std::future::pending::<()>().await;
        }
    }
}

#[async_trait]
impl SubnetAdapterClient for MockSubnetAdapter {
    async fn fetch_lease_status(&self, lease_id: &LeaseId) -> Result<LeaseHealth, RpcError> {
        self.maybe_hang().await;
        let mut state = self.state.lock();
        state.status_calls += 1;
        if let Some(err) = &state.status_error {
            return Err(err.clone());
        }
        Ok(LeaseHealth {
            active: !state.inactive.contains(lease_id),
        })
    }

    async fn fetch_slashing_events(&self, lease_id: &LeaseId, since: Timestamp) -> Result<Vec<SlashingEvent>, RpcError> {
        self.maybe_hang().await;
        let mut state = self.state.lock();
        state.event_queries.push((lease_id.clone(), since));
        if let Some(err) = &state.events_error {
            return Err(err.clone());
        }
        Ok(state
            .events
            .iter()
            .filter(|e| &e.lease_id == lease_id && e.occurred_at >= since)
            .cloned()
            .collect())
    }

    async fn activate_lease(&self, lease_id: &LeaseId) -> Result<(), RpcError> {
        self.maybe_hang().await;
        let mut state = self.state.lock();
        state.activation_attempts += 1;
        if state.failing_activations.contains(lease_id) {
            return Err(RpcError::Remote {
                code: -32000,
                message: format!("activation rejected for {lease_id}"),
            });
        }
        state.activated.push(lease_id.clone());
        Ok(())
    }
}

// =============================================================================
// ALERTS
// =============================================================================

/// Publisher that records alerts synchronously.
#[derive(Default)]
pub struct RecordingAlertPublisher {
    alerts: Mutex<Vec<Alert>>,
}

impl RecordingAlertPublisher {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// All alerts published so far.
    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.lock().clone()
    }

    /// Alerts of one kind.
    pub fn of_kind(&self, kind: AlertKind) -> Vec<Alert> {
        self.alerts.lock().iter().filter(|a| a.kind == kind).cloned().collect()
    }

    /// Number of alerts of one kind.
    pub fn count(&self, kind: AlertKind) -> usize {
        self.alerts.lock().iter().filter(|a| a.kind == kind).count()
    }
}

impl AlertPublisher for RecordingAlertPublisher {
    fn publish(&self, alert: Alert) {
        self.alerts.lock().push(alert);
    }
}

/// Sink that fails a configurable number of attempts before succeeding.
#[derive(Default)]
pub struct RecordingAlertSink {
    delivered: Mutex<Vec<Alert>>,
    failures_remaining: AtomicU32,
    attempts: AtomicU32,
}

impl RecordingAlertSink {
    /// Sink that always succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink whose first `failures` attempts fail.
    pub fn failing_first(failures: u32) -> Self {
        let sink = Self::default();
        sink.failures_remaining.store(failures, Ordering::SeqCst);
        sink
    }

    /// Successfully delivered alerts.
    pub fn delivered(&self) -> Vec<Alert> {
        self.delivered.lock().clone()
    }

    /// Total delivery attempts.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AlertSink for RecordingAlertSink {
    async fn send(&self, alert: &Alert) -> Result<(), AlertError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_remaining.store(remaining - 1, Ordering::SeqCst);
            return Err(AlertError::Rejected(503));
        }
        self.delivered.lock().push(alert.clone());
        Ok(())
    }
}
