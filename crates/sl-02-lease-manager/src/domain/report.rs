//! Per-cycle outcome summary.

use shared_types::LeaseId;

/// What one manager cycle changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Cycle sequence number, starting at 1.
    pub cycle: u64,
    /// `FetchPendingLeases` failed; reconciliation was skipped.
    pub fetch_failed: bool,
    /// Newly inserted pending leases.
    pub inserted: Vec<LeaseId>,
    /// Pending leases whose stake changed.
    pub topped_up: Vec<LeaseId>,
    /// Pending leases retracted by the main chain.
    pub retracted: Vec<LeaseId>,
    /// Leases moved to `Active`, in activation order.
    pub activated: Vec<LeaseId>,
    /// Failed `ActivateLease` calls.
    pub activation_failures: Vec<LeaseId>,
    /// Leases moved to `Expired`.
    pub expired: Vec<LeaseId>,
    /// Slashed leases terminated after the grace period.
    pub terminated: Vec<LeaseId>,
    /// Terminal leases handed to the archive and removed.
    pub archived: Vec<LeaseId>,
    /// Transitions lost to a concurrent writer.
    pub conflicts: u32,
}

impl CycleReport {
    /// Number of status transitions applied.
    pub fn transitions(&self) -> usize {
        self.retracted.len() + self.activated.len() + self.expired.len() + self.terminated.len()
    }

    /// Whether the cycle changed nothing in the store.
    pub fn is_quiet(&self) -> bool {
        self.transitions() == 0
            && self.inserted.is_empty()
            && self.topped_up.is_empty()
            && self.archived.is_empty()
    }
}
