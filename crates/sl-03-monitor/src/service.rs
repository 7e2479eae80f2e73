//! # Monitor Service
//!
//! Per `Active` lease, each cycle:
//!
//! 1. Warn once if the lease expires within `expiry_warning`.
//! 2. `FetchLeaseStatus`, then `FetchSlashingEvents(since = last check)`.
//!    Either call failing counts one consecutive failure; crossing the
//!    threshold raises a connectivity alert. Status is never changed on
//!    failure.
//! 3. New events: apply the stake reduction and move to `Slashed` (or
//!    `Terminated` at zero stake), one slashing alert per event.
//! 4. Subnet reports the lease inactive with no events: `Slashed` plus a
//!    state-mismatch alert.
//! 5. Otherwise stamp `last_checked_at` and reset the failure counter.
//!
//! `Slashed` leases still inside the grace period are polled for further
//! events only. Alerts are published after the transition commits.

use crate::config::MonitorConfig;
use crate::domain::{MonitorReport, WatchTable};
use shared_types::{
    with_timeout, Alert, AlertPublisher, Lease, LeaseHealth, LeaseStatus, RpcError, SlashingEvent,
    SubnetAdapterClient, SubnetAdapters, TimeSource, Timestamp,
};
use sl_01_lease_store::LeaseStore;
use sl_telemetry::log_lease_event;
use sl_telemetry::metrics::{self as telemetry, CYCLES, CYCLE_DURATION};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

const COMPONENT: &str = "monitor";

/// Periodic health and slashing checks over active leases.
pub struct Monitor {
    config: MonitorConfig,
    store: Arc<LeaseStore>,
    adapters: SubnetAdapters,
    alerts: Arc<dyn AlertPublisher>,
    clock: Arc<dyn TimeSource>,
    watches: WatchTable,
    cycle: u64,
}

enum Finding {
    Healthy,
    Slashed {
        events: Vec<SlashingEvent>,
        subnet_inactive: bool,
    },
    Mismatch,
}

impl Monitor {
    /// Create a monitor over `store`.
    pub fn new(
        config: MonitorConfig,
        store: Arc<LeaseStore>,
        adapters: SubnetAdapters,
        alerts: Arc<dyn AlertPublisher>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        let watches = WatchTable::new(config.failure_threshold);
        Self {
            config,
            store,
            adapters,
            alerts,
            clock,
            watches,
            cycle: 0,
        }
    }

    /// Configuration in force.
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Run cycles on the configured interval until `shutdown` flips to true.
    ///
    /// A cycle in progress always completes before the loop exits.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_ms = self.config.interval.as_millis() as u64,
            failure_threshold = self.config.failure_threshold,
            "[sl-03] Monitor started"
        );

        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
                _ = ticker.tick() => {}
            }

            let report = self.run_cycle().await;
            debug!(
                cycle = report.cycle,
                checked = report.checked,
                healthy = report.healthy.len(),
                failures = report.check_failures.len(),
                slashed = report.slashed.len(),
                "[sl-03] Cycle complete"
            );
        }

        info!("[sl-03] Monitor stopped");
    }

    /// Run one full cycle and report what was observed.
    pub async fn run_cycle(&mut self) -> MonitorReport {
        let _timer = sl_telemetry::time_histogram!(CYCLE_DURATION.with_label_values(&["monitor"]));
        self.cycle += 1;
        let now = self.clock.now();
        let mut report = MonitorReport {
            cycle: self.cycle,
            ..MonitorReport::default()
        };

        let active = self.store.list_by_status(LeaseStatus::Active);
        let in_grace: Vec<Lease> = self
            .store
            .list_by_status(LeaseStatus::Slashed)
            .into_iter()
            .filter(|l| self.within_grace(l, now))
            .collect();

        let watched: HashSet<_> = active
            .iter()
            .chain(in_grace.iter())
            .map(|l| l.lease_id.clone())
            .collect();
        self.watches.retain(|id| watched.contains(id));

        for lease in &active {
            report.checked += 1;
            self.warn_if_expiring(lease, now);
            self.check_active(lease, now, &mut report).await;
        }
        for lease in &in_grace {
            report.checked += 1;
            self.check_in_grace(lease, now, &mut report).await;
        }

        let outcome = if report.check_failures.is_empty() { "ok" } else { "degraded" };
        CYCLES.with_label_values(&["monitor", outcome]).inc();
        report
    }

    // =========================================================================
    // ACTIVE LEASES
    // =========================================================================

    async fn check_active(&mut self, lease: &Lease, now: Timestamp, report: &mut MonitorReport) {
        let health = match self.fetch_status(lease).await {
            Ok(health) => health,
            Err(e) => return self.record_failure(lease, &e, now, report),
        };
        let events = match self.fetch_events(lease).await {
            Ok(events) => events,
            Err(e) => return self.record_failure(lease, &e, now, report),
        };
        self.watches.record_success(&lease.lease_id);

        let events = self.watches.unseen_events(&lease.lease_id, events);
        let finding = match (events.is_empty(), health.active) {
            (false, active) => Finding::Slashed {
                events,
                subnet_inactive: !active,
            },
            (true, false) => Finding::Mismatch,
            (true, true) => Finding::Healthy,
        };

        match finding {
            Finding::Healthy => {
                let result = self.store.compare_and_transition(
                    &lease.lease_id,
                    LeaseStatus::Active,
                    LeaseStatus::Active,
                    |l| l.last_checked_at = Some(now),
                );
                match result {
                    Ok(_) => report.healthy.push(lease.lease_id.clone()),
                    Err(e) if e.is_conflict() => {
                        debug!(lease_id = %lease.lease_id, error = %e, "[sl-03] Health stamp lost to concurrent update");
                        report.conflicts += 1;
                    }
                    Err(e) => warn!(lease_id = %lease.lease_id, error = %e, "[sl-03] Health stamp rejected"),
                }
            }
            Finding::Mismatch => {
                let result = self.store.compare_and_transition(
                    &lease.lease_id,
                    LeaseStatus::Active,
                    LeaseStatus::Slashed,
                    |l| {
                        l.slashed_at = Some(now);
                        l.last_checked_at = Some(now);
                    },
                );
                match result {
                    Ok(_) => {
                        telemetry::record_transition("active", "slashed");
                        log_lease_event!(warn, COMPONENT, "Subnet reports active lease as inactive", lease.lease_id, lease.subnet_id);
                        self.alerts.publish(Alert::state_mismatch(lease, now));
                        report.mismatches.push(lease.lease_id.clone());
                        report.slashed.push(lease.lease_id.clone());
                    }
                    Err(e) if e.is_conflict() => {
                        debug!(lease_id = %lease.lease_id, error = %e, "[sl-03] Mismatch transition lost to concurrent update");
                        report.conflicts += 1;
                    }
                    Err(e) => warn!(lease_id = %lease.lease_id, error = %e, "[sl-03] Mismatch transition rejected"),
                }
            }
            Finding::Slashed {
                events,
                subnet_inactive,
            } => {
                if self.apply_slashing(lease, events, now, report) && subnet_inactive {
                    self.alerts.publish(Alert::state_mismatch(lease, now));
                    report.mismatches.push(lease.lease_id.clone());
                }
            }
        }
    }

    fn warn_if_expiring(&mut self, lease: &Lease, now: Timestamp) {
        if self.config.expiry_warning.is_zero() {
            return;
        }
        let Some(expires_at) = lease.expires_at else {
            return;
        };
        if expires_at <= now {
            return;
        }
        let remaining = expires_at.secs_since(now);
        if remaining > self.config.expiry_warning.as_secs() {
            return;
        }
        if self.watches.take_expiry_warning(&lease.lease_id) {
            log_lease_event!(info, COMPONENT, "Lease expiring soon", lease.lease_id, lease.subnet_id, expires_in_secs = remaining);
            self.alerts.publish(Alert::expiring_soon(lease, remaining, now));
        }
    }

    // =========================================================================
    // SLASHED LEASES IN GRACE
    // =========================================================================

    fn within_grace(&self, lease: &Lease, now: Timestamp) -> bool {
        let slashed_at = lease.slashed_at.unwrap_or_else(|| lease.slashing_window_start());
        now < slashed_at.add_duration(self.config.slashing_grace_period)
    }

    async fn check_in_grace(&mut self, lease: &Lease, now: Timestamp, report: &mut MonitorReport) {
        let events = match self.fetch_events(lease).await {
            Ok(events) => events,
            Err(e) => return self.record_failure(lease, &e, now, report),
        };
        self.watches.record_success(&lease.lease_id);

        let events = self.watches.unseen_events(&lease.lease_id, events);
        if events.is_empty() {
            let result = self.store.compare_and_transition(
                &lease.lease_id,
                LeaseStatus::Slashed,
                LeaseStatus::Slashed,
                |l| l.last_checked_at = Some(now),
            );
            match result {
                Ok(_) => {}
                Err(e) if e.is_conflict() => {
                    debug!(lease_id = %lease.lease_id, error = %e, "[sl-03] Grace check stamp lost to concurrent update");
                    report.conflicts += 1;
                }
                Err(e) => warn!(lease_id = %lease.lease_id, error = %e, "[sl-03] Grace check stamp rejected"),
            }
            return;
        }
        self.apply_slashing(lease, events, now, report);
    }

    // =========================================================================
    // SLASHING
    // =========================================================================

    /// Apply `events` in one transition. Returns true when it committed.
    fn apply_slashing(
        &mut self,
        lease: &Lease,
        events: Vec<SlashingEvent>,
        now: Timestamp,
        report: &mut MonitorReport,
    ) -> bool {
        let total = events
            .iter()
            .fold(0u64, |acc, e| acc.saturating_add(e.amount));
        let remaining = lease.stake.saturating_sub(total);
        let next = if remaining == 0 {
            LeaseStatus::Terminated
        } else {
            LeaseStatus::Slashed
        };
        let result = self
            .store
            .compare_and_transition(&lease.lease_id, lease.status, next, |l| {
                l.stake = remaining;
                l.slashed_at = Some(now);
                l.last_checked_at = Some(now);
            });

        match result {
            Ok(updated) => {
                telemetry::record_transition(lease.status.as_str(), updated.status.as_str());
                self.watches
                    .mark_applied(&lease.lease_id, events.iter().map(|e| e.reference.as_str()));

                let mut stake = lease.stake;
                for event in &events {
                    stake = stake.saturating_sub(event.amount);
                    log_lease_event!(
                        warn,
                        COMPONENT,
                        "Slashing event applied",
                        lease.lease_id,
                        lease.subnet_id,
                        amount = event.amount,
                        remaining_stake = stake,
                        reference = %event.reference
                    );
                    self.alerts.publish(Alert::slashing(lease, event, stake, now));
                }

                if next == LeaseStatus::Terminated {
                    report.terminated.push(lease.lease_id.clone());
                } else {
                    report.slashed.push(lease.lease_id.clone());
                }
                true
            }
            Err(e) if e.is_conflict() => {
                debug!(lease_id = %lease.lease_id, error = %e, "[sl-03] Slashing transition lost to concurrent update");
                report.conflicts += 1;
                false
            }
            Err(e) => {
                warn!(lease_id = %lease.lease_id, error = %e, "[sl-03] Slashing transition rejected");
                false
            }
        }
    }

    // =========================================================================
    // REMOTE CALLS
    // =========================================================================

    fn adapter(&self, lease: &Lease) -> Result<Arc<dyn SubnetAdapterClient>, RpcError> {
        self.adapters
            .get(&lease.subnet_id)
            .cloned()
            .ok_or_else(|| RpcError::UnknownSubnet(lease.subnet_id.clone()))
    }

    async fn fetch_status(&self, lease: &Lease) -> Result<LeaseHealth, RpcError> {
        let adapter = self.adapter(lease)?;
        let started = Instant::now();
        let result = with_timeout(
            "fetch_lease_status",
            self.config.rpc_timeout,
            adapter.fetch_lease_status(&lease.lease_id),
        )
        .await;
        record_rpc("fetch_lease_status", &result, started);
        result
    }

    async fn fetch_events(&self, lease: &Lease) -> Result<Vec<SlashingEvent>, RpcError> {
        let adapter = self.adapter(lease)?;
        let started = Instant::now();
        let result = with_timeout(
            "fetch_slashing_events",
            self.config.rpc_timeout,
            adapter.fetch_slashing_events(&lease.lease_id, lease.slashing_window_start()),
        )
        .await;
        record_rpc("fetch_slashing_events", &result, started);
        result
    }

    fn record_failure(&mut self, lease: &Lease, error: &RpcError, now: Timestamp, report: &mut MonitorReport) {
        let count = self.watches.record_failure(&lease.lease_id);
        warn!(
            lease_id = %lease.lease_id,
            subnet_id = %lease.subnet_id,
            consecutive_failures = count.consecutive,
            error = %error,
            "[sl-03] Lease check failed"
        );
        report.check_failures.push(lease.lease_id.clone());

        if count.raise_alert {
            log_lease_event!(
                error,
                COMPONENT,
                "Subnet adapter presumed degraded",
                lease.lease_id,
                lease.subnet_id,
                consecutive_failures = count.consecutive
            );
            self.alerts.publish(Alert::connectivity(
                lease,
                count.consecutive,
                &error.to_string(),
                now,
            ));
            report.connectivity_alerts.push(lease.lease_id.clone());
        }
    }
}

fn record_rpc<T>(method: &str, result: &Result<T, RpcError>, started: Instant) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(e) if e.is_timeout() => "timeout",
        Err(_) => "error",
    };
    telemetry::record_rpc(method, outcome, started.elapsed().as_secs_f64());
}
