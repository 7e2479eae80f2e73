//! # Activation Retry Tracking
//!
//! Per-lease consecutive activation failures. Below the retry limit a
//! failing lease is retried every cycle. From the limit on it is
//! deprioritized: the next attempt is `2^k` cycles later, with `k` growing
//! per failure and capped at [`MAX_BACKOFF_EXPONENT`].

use shared_types::LeaseId;
use std::collections::HashMap;

/// Upper bound of the backoff exponent (16 cycles).
pub const MAX_BACKOFF_EXPONENT: u32 = 4;

#[derive(Debug, Clone, Copy)]
struct Attempts {
    failures: u32,
    next_due_cycle: u64,
}

/// Result of recording one failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureOutcome {
    /// Consecutive failures including this one.
    pub failures: u32,
    /// Exactly at the retry limit; raise the standing alert now.
    pub raise_alert: bool,
    /// Cycle of the next attempt.
    pub next_due_cycle: u64,
}

/// Consecutive-failure bookkeeping keyed by lease.
#[derive(Debug, Clone)]
pub struct ActivationTracker {
    retry_limit: u32,
    attempts: HashMap<LeaseId, Attempts>,
}

impl ActivationTracker {
    /// A zero limit is treated as one.
    pub fn new(retry_limit: u32) -> Self {
        Self {
            retry_limit: retry_limit.max(1),
            attempts: HashMap::new(),
        }
    }

    /// Whether `lease_id` may be attempted in `cycle`.
    pub fn is_due(&self, lease_id: &LeaseId, cycle: u64) -> bool {
        self.attempts
            .get(lease_id)
            .map_or(true, |a| cycle >= a.next_due_cycle)
    }

    /// Record a failed attempt in `cycle`.
    pub fn record_failure(&mut self, lease_id: &LeaseId, cycle: u64) -> FailureOutcome {
        let retry_limit = self.retry_limit;
        let entry = self.attempts.entry(lease_id.clone()).or_insert(Attempts {
            failures: 0,
            next_due_cycle: cycle,
        });
        entry.failures = entry.failures.saturating_add(1);

        let delay = if entry.failures < retry_limit {
            1
        } else {
            let exponent = (entry.failures - retry_limit + 1).min(MAX_BACKOFF_EXPONENT);
            1u64 << exponent
        };
        entry.next_due_cycle = cycle.saturating_add(delay);

        FailureOutcome {
            failures: entry.failures,
            raise_alert: entry.failures == retry_limit,
            next_due_cycle: entry.next_due_cycle,
        }
    }

    /// Forget `lease_id` after a successful activation.
    pub fn clear(&mut self, lease_id: &LeaseId) {
        self.attempts.remove(lease_id);
    }

    /// Drop entries for leases that are no longer pending.
    pub fn retain(&mut self, mut keep: impl FnMut(&LeaseId) -> bool) {
        self.attempts.retain(|id, _| keep(id));
    }

    /// Consecutive failures recorded for `lease_id`.
    pub fn failures(&self, lease_id: &LeaseId) -> u32 {
        self.attempts.get(lease_id).map_or(0, |a| a.failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_lease_is_due() {
        let tracker = ActivationTracker::new(3);
        assert!(tracker.is_due(&LeaseId::new("L1"), 0));
    }

    #[test]
    fn test_retries_every_cycle_below_limit() {
        let mut tracker = ActivationTracker::new(3);
        let id = LeaseId::new("L1");

        let first = tracker.record_failure(&id, 1);
        assert_eq!(first.failures, 1);
        assert!(!first.raise_alert);
        assert!(tracker.is_due(&id, 2));
    }

    #[test]
    fn test_alert_exactly_once_at_limit() {
        let mut tracker = ActivationTracker::new(2);
        let id = LeaseId::new("L1");

        assert!(!tracker.record_failure(&id, 1).raise_alert);
        assert!(tracker.record_failure(&id, 2).raise_alert);
        assert!(!tracker.record_failure(&id, 4).raise_alert);
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let mut tracker = ActivationTracker::new(1);
        let id = LeaseId::new("L1");

        let mut cycle = 0;
        let mut delays = Vec::new();
        for _ in 0..6 {
            let outcome = tracker.record_failure(&id, cycle);
            delays.push(outcome.next_due_cycle - cycle);
            cycle = outcome.next_due_cycle;
        }
        assert_eq!(delays, vec![2, 4, 8, 16, 16, 16]);
    }

    #[test]
    fn test_not_due_inside_backoff_window() {
        let mut tracker = ActivationTracker::new(1);
        let id = LeaseId::new("L1");

        tracker.record_failure(&id, 10);
        assert!(!tracker.is_due(&id, 11));
        assert!(tracker.is_due(&id, 12));
    }

    #[test]
    fn test_clear_and_retain() {
        let mut tracker = ActivationTracker::new(3);
        let a = LeaseId::new("A");
        let b = LeaseId::new("B");
        tracker.record_failure(&a, 0);
        tracker.record_failure(&b, 0);

        tracker.clear(&a);
        assert_eq!(tracker.failures(&a), 0);

        tracker.retain(|id| id != &b);
        assert_eq!(tracker.failures(&b), 0);
    }

    #[test]
    fn test_zero_limit_treated_as_one() {
        let mut tracker = ActivationTracker::new(0);
        assert!(tracker.record_failure(&LeaseId::new("L1"), 0).raise_alert);
    }
}
