//! # Watch Table
//!
//! What the monitor remembers about each lease between cycles: consecutive
//! adapter failures, slashing events already applied, and whether the
//! expiry warning went out.

use shared_types::{LeaseId, SlashingEvent};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default, Clone)]
struct LeaseWatch {
    failures: u32,
    applied_events: HashSet<String>,
    expiry_warned: bool,
}

/// Result of recording one failed check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureCount {
    /// Consecutive failures including this one.
    pub consecutive: u32,
    /// The threshold was crossed by this failure.
    pub raise_alert: bool,
}

/// Monitoring state keyed by lease.
#[derive(Debug, Clone)]
pub struct WatchTable {
    threshold: u32,
    watches: HashMap<LeaseId, LeaseWatch>,
}

impl WatchTable {
    /// A zero threshold is treated as one.
    pub fn new(failure_threshold: u32) -> Self {
        Self {
            threshold: failure_threshold.max(1),
            watches: HashMap::new(),
        }
    }

    /// Count a failed check. Alerts exactly when the threshold is reached.
    pub fn record_failure(&mut self, lease_id: &LeaseId) -> FailureCount {
        let watch = self.watches.entry(lease_id.clone()).or_default();
        watch.failures = watch.failures.saturating_add(1);
        FailureCount {
            consecutive: watch.failures,
            raise_alert: watch.failures == self.threshold,
        }
    }

    /// Reset the failure counter after a successful check.
    pub fn record_success(&mut self, lease_id: &LeaseId) {
        if let Some(watch) = self.watches.get_mut(lease_id) {
            watch.failures = 0;
        }
    }

    /// Current consecutive failures.
    pub fn consecutive_failures(&self, lease_id: &LeaseId) -> u32 {
        self.watches.get(lease_id).map_or(0, |w| w.failures)
    }

    /// Events not applied before, deduplicated by reference.
    pub fn unseen_events(&self, lease_id: &LeaseId, events: Vec<SlashingEvent>) -> Vec<SlashingEvent> {
        let applied = self.watches.get(lease_id).map(|w| &w.applied_events);
        let mut batch = HashSet::new();
        events
            .into_iter()
            .filter(|e| &e.lease_id == lease_id)
            .filter(|e| !applied.is_some_and(|a| a.contains(&e.reference)))
            .filter(|e| batch.insert(e.reference.clone()))
            .collect()
    }

    /// Remember events as applied.
    pub fn mark_applied<'a>(&mut self, lease_id: &LeaseId, references: impl IntoIterator<Item = &'a str>) {
        let watch = self.watches.entry(lease_id.clone()).or_default();
        watch
            .applied_events
            .extend(references.into_iter().map(str::to_string));
    }

    /// True the first time it is called for `lease_id`.
    pub fn take_expiry_warning(&mut self, lease_id: &LeaseId) -> bool {
        let watch = self.watches.entry(lease_id.clone()).or_default();
        !std::mem::replace(&mut watch.expiry_warned, true)
    }

    /// Drop state for leases that are no longer monitored.
    pub fn retain(&mut self, mut keep: impl FnMut(&LeaseId) -> bool) {
        self.watches.retain(|id, _| keep(id));
    }

    /// Number of leases with state.
    pub fn len(&self) -> usize {
        self.watches.len()
    }

    /// Whether no lease has state.
    pub fn is_empty(&self) -> bool {
        self.watches.is_empty()
    }
}
