use shared_types::LeaseId;

/// What one monitor cycle observed and changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorReport {
    /// Cycle sequence number, starting at 1.
    pub cycle: u64,
    /// Leases polled.
    pub checked: usize,
    /// Active leases confirmed healthy.
    pub healthy: Vec<LeaseId>,
    /// Leases whose status or events call failed.
    pub check_failures: Vec<LeaseId>,
    /// Leases moved to (or kept in) `Slashed` by new events or a mismatch.
    pub slashed: Vec<LeaseId>,
    /// Leases terminated because slashing consumed all stake.
    pub terminated: Vec<LeaseId>,
    /// Active leases the subnet reported inactive.
    pub mismatches: Vec<LeaseId>,
    /// Connectivity alerts raised.
    pub connectivity_alerts: Vec<LeaseId>,
    /// Transitions lost to a concurrent writer.
    pub conflicts: u32,
}
