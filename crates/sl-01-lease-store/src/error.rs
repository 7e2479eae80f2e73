//! # Store Errors

use shared_types::{LeaseId, LeaseStatus};
use thiserror::Error;

/// Lease store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LeaseStoreError {
    /// No lease with this id.
    #[error("lease not found: {0}")]
    NotFound(LeaseId),

    /// Current status differs from the caller's expectation.
    ///
    /// The losing side of a race; re-evaluate on the next cycle.
    #[error("conflict on lease {lease_id}: expected {expected}, found {actual}")]
    Conflict {
        /// Lease being transitioned.
        lease_id: LeaseId,
        /// Status the caller expected.
        expected: LeaseStatus,
        /// Status actually stored.
        actual: LeaseStatus,
    },

    /// The state machine forbids this transition.
    #[error("invalid transition for lease {lease_id}: {from} -> {to}")]
    InvalidTransition {
        /// Lease being transitioned.
        lease_id: LeaseId,
        /// Current status.
        from: LeaseStatus,
        /// Requested status.
        to: LeaseStatus,
    },

    /// Activation would exceed the active-lease cap.
    #[error("active lease cap reached ({max_active})")]
    CapacityExceeded {
        /// Configured cap.
        max_active: usize,
    },

    /// Activation with stake below the minimum.
    #[error("lease {lease_id} stake {stake} below minimum {min_stake}")]
    InsufficientStake {
        /// Lease being activated.
        lease_id: LeaseId,
        /// Its stake.
        stake: u64,
        /// Configured minimum.
        min_stake: u64,
    },

    /// A mutation broke an entity invariant.
    #[error("invariant violated for lease {lease_id}: {reason}")]
    Invariant {
        /// Lease being mutated.
        lease_id: LeaseId,
        /// Which invariant.
        reason: String,
    },

    /// The lease was archived and cannot be re-inserted.
    #[error("lease {0} already archived")]
    Archived(LeaseId),

    /// Only terminal leases may be archived.
    #[error("lease {lease_id} is {status}, not terminal")]
    NotTerminal {
        /// Lease id.
        lease_id: LeaseId,
        /// Its current status.
        status: LeaseStatus,
    },
}

impl LeaseStoreError {
    /// Whether this is a lost compare-and-transition race.
    pub fn is_conflict(&self) -> bool {
        matches!(self, LeaseStoreError::Conflict { .. })
    }

    /// Whether this is a policy deferral (cap or stake), not a fault.
    pub fn is_policy_deferral(&self) -> bool {
        matches!(
            self,
            LeaseStoreError::CapacityExceeded { .. } | LeaseStoreError::InsufficientStake { .. }
        )
    }
}

/// Archival hook failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("archive failed: {0}")]
pub struct ArchiveError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_display_and_predicate() {
        let err = LeaseStoreError::Conflict {
            lease_id: LeaseId::new("lease-1"),
            expected: LeaseStatus::Active,
            actual: LeaseStatus::Slashed,
        };
        assert!(err.is_conflict());
        assert!(!err.is_policy_deferral());
        assert_eq!(err.to_string(), "conflict on lease lease-1: expected active, found slashed");
    }

    #[test]
    fn test_policy_deferral() {
        assert!(LeaseStoreError::CapacityExceeded { max_active: 2 }.is_policy_deferral());
    }
}
