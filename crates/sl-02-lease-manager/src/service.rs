//! # Lease Manager Service
//!
//! One cycle, in order:
//!
//! 1. Fetch pending leases from the main chain and reconcile (insert new,
//!    top up pending stake, terminate retracted pending leases).
//! 2. Activate pending leases in ascending id order while capacity allows.
//! 3. Expire active leases whose term has run out.
//! 4. Terminate slashed leases past the grace period.
//! 5. Standing alerts: pending too long, bonded balance below commitment.
//! 6. Hand terminal leases to the archive hook, if one is configured.
//!
//! Remote failures are logged and retried next cycle. A lost
//! compare-and-transition is left for the next cycle to re-evaluate.

use crate::config::LeaseManagerConfig;
use crate::domain::{ActivationTracker, CycleReport};
use shared_types::{
    with_timeout, Alert, AlertPublisher, Lease, LeaseDescriptor, LeaseId, LeaseStatus,
    MainChainClient, RpcError, SubnetAdapters, TimeSource, Timestamp,
};
use sl_01_lease_store::{LeaseArchive, LeaseStore, LeaseStoreError};
use sl_telemetry::log_lease_event;
use sl_telemetry::metrics::{self as telemetry, CYCLES, CYCLE_DURATION, STAKE_BALANCE, STAKE_COMMITTED};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

const COMPONENT: &str = "lease-manager";

/// Reconciles the lease table with the main chain and applies lifecycle policy.
pub struct LeaseManager {
    config: LeaseManagerConfig,
    store: Arc<LeaseStore>,
    main_chain: Arc<dyn MainChainClient>,
    adapters: SubnetAdapters,
    alerts: Arc<dyn AlertPublisher>,
    clock: Arc<dyn TimeSource>,
    archive: Option<Arc<dyn LeaseArchive>>,
    activation: ActivationTracker,
    pending_alerted: HashSet<LeaseId>,
    over_leased: bool,
    cycle: u64,
}

impl LeaseManager {
    /// Create a manager over `store`.
    pub fn new(
        config: LeaseManagerConfig,
        store: Arc<LeaseStore>,
        main_chain: Arc<dyn MainChainClient>,
        adapters: SubnetAdapters,
        alerts: Arc<dyn AlertPublisher>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        let activation = ActivationTracker::new(config.activation_retry_limit);
        Self {
            config,
            store,
            main_chain,
            adapters,
            alerts,
            clock,
            archive: None,
            activation,
            pending_alerted: HashSet::new(),
            over_leased: false,
            cycle: 0,
        }
    }

    /// Hand terminal leases to `archive` and drop them from the store.
    pub fn with_archive(mut self, archive: Arc<dyn LeaseArchive>) -> Self {
        self.archive = Some(archive);
        self
    }

    /// Configuration in force.
    pub fn config(&self) -> &LeaseManagerConfig {
        &self.config
    }

    /// Run cycles on the configured interval until `shutdown` flips to true.
    ///
    /// A cycle in progress always completes before the loop exits.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_ms = self.config.interval.as_millis() as u64,
            auto_activate = self.config.auto_activate,
            "[sl-02] Lease manager started"
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
            if !report.is_quiet() {
                info!(
                    cycle = report.cycle,
                    inserted = report.inserted.len(),
                    activated = report.activated.len(),
                    expired = report.expired.len(),
                    terminated = report.terminated.len() + report.retracted.len(),
                    "[sl-02] Cycle applied changes"
                );
            }
        }

        info!("[sl-02] Lease manager stopped");
    }

    /// Run one full cycle and report what changed.
    pub async fn run_cycle(&mut self) -> CycleReport {
        let _timer = sl_telemetry::time_histogram!(CYCLE_DURATION.with_label_values(&["manager"]));
        self.cycle += 1;
        let now = self.clock.now();
        let mut report = CycleReport {
            cycle: self.cycle,
            ..CycleReport::default()
        };

        match self.fetch_pending().await {
            Ok(descriptors) => self.reconcile(descriptors, now, &mut report),
            Err(e) => {
                warn!(error = %e, "[sl-02] Failed to fetch pending leases, retrying next cycle");
                report.fetch_failed = true;
            }
        }

        if self.config.auto_activate {
            self.activate_pending(now, &mut report).await;
        }
        self.expire_active(now, &mut report);
        self.terminate_after_grace(now, &mut report);
        self.check_pending_age(now);
        self.check_stake_balance(now).await;
        if let Some(archive) = self.archive.clone() {
            self.archive_terminal(archive.as_ref(), &mut report).await;
        }

        self.update_gauges();
        let outcome = if report.fetch_failed { "degraded" } else { "ok" };
        CYCLES.with_label_values(&["manager", outcome]).inc();
        report
    }

    async fn fetch_pending(&self) -> Result<Vec<LeaseDescriptor>, RpcError> {
        let started = Instant::now();
        let result = with_timeout(
            "fetch_pending_leases",
            self.config.rpc_timeout,
            self.main_chain
                .fetch_pending_leases(&self.config.validator_address),
        )
        .await;
        record_rpc("fetch_pending_leases", &result, started);
        result
    }

    // =========================================================================
    // RECONCILIATION
    // =========================================================================

    fn reconcile(&mut self, descriptors: Vec<LeaseDescriptor>, now: Timestamp, report: &mut CycleReport) {
        let fetched: HashSet<LeaseId> = descriptors.iter().map(|d| d.lease_id.clone()).collect();

        for descriptor in &descriptors {
            if self.store.is_archived(&descriptor.lease_id) {
                continue;
            }
            if descriptor.stake == 0 {
                warn!(lease_id = %descriptor.lease_id, "[sl-02] Ignoring lease descriptor with zero stake");
                continue;
            }
            if !self.adapters.contains_key(&descriptor.subnet_id) {
                debug!(
                    lease_id = %descriptor.lease_id,
                    subnet_id = %descriptor.subnet_id,
                    "[sl-02] Lease targets a subnet with no configured adapter"
                );
            }

            match self.store.get(&descriptor.lease_id) {
                None => self.insert_pending(descriptor, now, report),
                Some(lease) if lease.status == LeaseStatus::Pending && descriptor.stake > lease.stake => {
                    self.top_up(&lease, descriptor.stake, report)
                }
                Some(lease) if lease.status == LeaseStatus::Pending && descriptor.stake < lease.stake => {
                    warn!(
                        lease_id = %lease.lease_id,
                        local = lease.stake,
                        reported = descriptor.stake,
                        "[sl-02] Ignoring stake reduction outside slashing"
                    );
                }
                Some(_) => {}
            }
        }

        for lease in self.store.list_by_status(LeaseStatus::Pending) {
            if fetched.contains(&lease.lease_id) || lease.activated_at.is_some() {
                continue;
            }
            let result = self.store.compare_and_transition(
                &lease.lease_id,
                LeaseStatus::Pending,
                LeaseStatus::Terminated,
                |_| {},
            );
            if self.applied(&lease, LeaseStatus::Pending, result, report) {
                log_lease_event!(info, COMPONENT, "Pending lease retracted by main chain", lease.lease_id, lease.subnet_id);
                report.retracted.push(lease.lease_id.clone());
            }
        }
    }

    fn insert_pending(&self, descriptor: &LeaseDescriptor, now: Timestamp, report: &mut CycleReport) {
        let lease = Lease::pending(descriptor, self.config.default_lease_duration, now);
        match self.store.upsert(lease) {
            Ok(()) => {
                log_lease_event!(
                    info,
                    COMPONENT,
                    "New pending lease",
                    descriptor.lease_id,
                    descriptor.subnet_id,
                    stake = descriptor.stake
                );
                report.inserted.push(descriptor.lease_id.clone());
            }
            Err(e) => warn!(lease_id = %descriptor.lease_id, error = %e, "[sl-02] Failed to insert lease"),
        }
    }

    fn top_up(&self, lease: &Lease, stake: u64, report: &mut CycleReport) {
        let result = self.store.compare_and_transition(
            &lease.lease_id,
            LeaseStatus::Pending,
            LeaseStatus::Pending,
            |l| l.stake = stake,
        );
        match result {
            Ok(_) => {
                log_lease_event!(
                    info,
                    COMPONENT,
                    "Pending lease stake topped up",
                    lease.lease_id,
                    lease.subnet_id,
                    from = lease.stake,
                    to = stake
                );
                report.topped_up.push(lease.lease_id.clone());
            }
            Err(e) if e.is_conflict() => report.conflicts += 1,
            Err(e) => warn!(lease_id = %lease.lease_id, error = %e, "[sl-02] Stake update rejected"),
        }
    }

    // =========================================================================
    // ACTIVATION
    // =========================================================================

    async fn activate_pending(&mut self, now: Timestamp, report: &mut CycleReport) {
        let policy = self.store.policy();

        for lease in self.store.list_by_status(LeaseStatus::Pending) {
            if !policy.has_capacity(self.store.count_active()) {
                debug!(max_active = policy.max_active, "[sl-02] Active lease cap reached, deferring");
                break;
            }
            if !policy.stake_sufficient(lease.stake) {
                debug!(
                    lease_id = %lease.lease_id,
                    stake = lease.stake,
                    min_stake = policy.min_stake,
                    "[sl-02] Stake below minimum, deferring"
                );
                continue;
            }
            if !self.activation.is_due(&lease.lease_id, self.cycle) {
                continue;
            }

            match self.call_activate(&lease).await {
                Ok(()) => {
                    let activated_at = self.clock.now();
                    let result = self.store.compare_and_transition(
                        &lease.lease_id,
                        LeaseStatus::Pending,
                        LeaseStatus::Active,
                        |l| l.stamp_activation(activated_at),
                    );
                    if self.applied(&lease, LeaseStatus::Pending, result, report) {
                        self.activation.clear(&lease.lease_id);
                        log_lease_event!(info, COMPONENT, "Lease activated", lease.lease_id, lease.subnet_id);
                        report.activated.push(lease.lease_id.clone());
                    }
                }
                Err(e) => {
                    let outcome = self.activation.record_failure(&lease.lease_id, self.cycle);
                    warn!(
                        lease_id = %lease.lease_id,
                        subnet_id = %lease.subnet_id,
                        failures = outcome.failures,
                        next_attempt_cycle = outcome.next_due_cycle,
                        error = %e,
                        "[sl-02] Lease activation failed"
                    );
                    if outcome.raise_alert {
                        self.alerts.publish(Alert::activation_failed(
                            &lease,
                            outcome.failures,
                            &e.to_string(),
                            now,
                        ));
                    }
                    report.activation_failures.push(lease.lease_id.clone());
                }
            }
        }
    }

    async fn call_activate(&self, lease: &Lease) -> Result<(), RpcError> {
        let adapter = self
            .adapters
            .get(&lease.subnet_id)
            .ok_or_else(|| RpcError::UnknownSubnet(lease.subnet_id.clone()))?;
        let started = Instant::now();
        let result = with_timeout(
            "activate_lease",
            self.config.rpc_timeout,
            adapter.activate_lease(&lease.lease_id),
        )
        .await;
        record_rpc("activate_lease", &result, started);
        result
    }

    // =========================================================================
    // EXPIRY AND GRACE
    // =========================================================================

    fn expire_active(&self, now: Timestamp, report: &mut CycleReport) {
        for lease in self.store.list_by_status(LeaseStatus::Active) {
            if !lease.is_expired_at(now) {
                continue;
            }
            let result = self.store.compare_and_transition(
                &lease.lease_id,
                LeaseStatus::Active,
                LeaseStatus::Expired,
                |_| {},
            );
            if self.applied(&lease, LeaseStatus::Active, result, report) {
                log_lease_event!(info, COMPONENT, "Lease expired", lease.lease_id, lease.subnet_id);
                report.expired.push(lease.lease_id.clone());
            }
        }
    }

    fn terminate_after_grace(&self, now: Timestamp, report: &mut CycleReport) {
        for lease in self.store.list_by_status(LeaseStatus::Slashed) {
            let slashed_at = lease.slashed_at.unwrap_or_else(|| lease.slashing_window_start());
            if now < slashed_at.add_duration(self.config.slashing_grace_period) {
                continue;
            }
            let result = self.store.compare_and_transition(
                &lease.lease_id,
                LeaseStatus::Slashed,
                LeaseStatus::Terminated,
                |_| {},
            );
            if self.applied(&lease, LeaseStatus::Slashed, result, report) {
                log_lease_event!(
                    info,
                    COMPONENT,
                    "Slashed lease terminated after grace period",
                    lease.lease_id,
                    lease.subnet_id,
                    stake = lease.stake
                );
                report.terminated.push(lease.lease_id.clone());
            }
        }
    }

    // =========================================================================
    // STANDING CONDITIONS
    // =========================================================================

    fn check_pending_age(&mut self, now: Timestamp) {
        let pending = self.store.list_by_status(LeaseStatus::Pending);
        let pending_ids: HashSet<LeaseId> = pending.iter().map(|l| l.lease_id.clone()).collect();
        self.pending_alerted.retain(|id| pending_ids.contains(id));
        self.activation.retain(|id| pending_ids.contains(id));

        let threshold = self.config.pending_alert_after.as_secs();
        for lease in pending {
            let age = now.secs_since(lease.created_at);
            if age < threshold || self.pending_alerted.contains(&lease.lease_id) {
                continue;
            }
            log_lease_event!(warn, COMPONENT, "Lease stuck in pending", lease.lease_id, lease.subnet_id, pending_secs = age);
            self.alerts.publish(Alert::pending_stuck(&lease, age, now));
            self.pending_alerted.insert(lease.lease_id.clone());
        }
    }

    async fn check_stake_balance(&mut self, now: Timestamp) {
        let started = Instant::now();
        let result = with_timeout(
            "fetch_stake_balance",
            self.config.rpc_timeout,
            self.main_chain
                .fetch_stake_balance(&self.config.validator_address),
        )
        .await;
        record_rpc("fetch_stake_balance", &result, started);

        let balance = match result {
            Ok(balance) => balance,
            Err(e) => {
                warn!(error = %e, "[sl-02] Failed to fetch stake balance");
                return;
            }
        };
        STAKE_BALANCE.set(balance as f64);

        let committed = self.store.committed_stake();
        if balance < committed {
            if !self.over_leased {
                warn!(balance, committed, "[sl-02] Committed stake exceeds bonded balance");
                self.alerts.publish(Alert::over_leased(balance, committed, now));
            }
            self.over_leased = true;
        } else {
            self.over_leased = false;
        }
    }

    // =========================================================================
    // ARCHIVAL
    // =========================================================================

    async fn archive_terminal(&self, archive: &dyn LeaseArchive, report: &mut CycleReport) {
        let terminal = self
            .store
            .snapshot()
            .into_iter()
            .filter(|l| l.status.is_terminal());

        for lease in terminal {
            match tokio::time::timeout(self.config.rpc_timeout, archive.archive(&lease)).await {
                Ok(Ok(())) => match self.store.remove_archived(&lease.lease_id) {
                    Ok(_) => {
                        debug!(lease_id = %lease.lease_id, status = %lease.status, "[sl-02] Lease archived");
                        report.archived.push(lease.lease_id.clone());
                    }
                    Err(e) => warn!(lease_id = %lease.lease_id, error = %e, "[sl-02] Failed to drop archived lease"),
                },
                Ok(Err(e)) => warn!(lease_id = %lease.lease_id, error = %e, "[sl-02] Archive hook failed"),
                Err(_) => warn!(lease_id = %lease.lease_id, "[sl-02] Archive hook timed out"),
            }
        }
    }

    // =========================================================================
    // HELPERS
    // =========================================================================

    /// Classify a transition result. Returns true when it was committed.
    fn applied(
        &self,
        lease: &Lease,
        from: LeaseStatus,
        result: Result<Lease, LeaseStoreError>,
        report: &mut CycleReport,
    ) -> bool {
        match result {
            Ok(updated) => {
                telemetry::record_transition(from.as_str(), updated.status.as_str());
                true
            }
            Err(e) if e.is_conflict() => {
                debug!(lease_id = %lease.lease_id, error = %e, "[sl-02] Transition lost to concurrent update");
                report.conflicts += 1;
                false
            }
            Err(e) if e.is_policy_deferral() => {
                debug!(lease_id = %lease.lease_id, error = %e, "[sl-02] Transition deferred by policy");
                false
            }
            Err(e) => {
                warn!(lease_id = %lease.lease_id, error = %e, "[sl-02] Transition rejected");
                false
            }
        }
    }

    fn update_gauges(&self) {
        let counts = self.store.status_counts();
        telemetry::set_lease_counts(counts.iter().map(|(s, c)| (s.as_str(), *c)));
        STAKE_COMMITTED.set(self.store.committed_stake() as f64);
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
