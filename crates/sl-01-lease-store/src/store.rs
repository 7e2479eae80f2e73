//! # Lease Store
//!
//! `RwLock`-guarded lease table. Reads clone out of the lock; every write
//! validates the post-state before committing, so a rejected mutation leaves
//! the stored lease untouched.

use crate::error::LeaseStoreError;
use crate::policy::ActivationPolicy;
use parking_lot::RwLock;
use shared_types::{Lease, LeaseId, LeaseStatus};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, trace};

struct StoreState {
    /// Ordered by id so listings are deterministic.
    leases: BTreeMap<LeaseId, Lease>,
    /// Ids removed by archival. Never re-admitted.
    archived: HashSet<LeaseId>,
}

impl StoreState {
    fn count(&self, status: LeaseStatus) -> usize {
        self.leases.values().filter(|l| l.status == status).count()
    }
}

/// Authoritative lease table.
pub struct LeaseStore {
    state: RwLock<StoreState>,
    policy: ActivationPolicy,
}

impl LeaseStore {
    /// Create an empty store enforcing `policy`.
    pub fn new(policy: ActivationPolicy) -> Self {
        Self {
            state: RwLock::new(StoreState {
                leases: BTreeMap::new(),
                archived: HashSet::new(),
            }),
            policy,
        }
    }

    /// The activation policy in force.
    pub fn policy(&self) -> ActivationPolicy {
        self.policy
    }

    /// Insert a new lease or replace an existing one with the same id.
    ///
    /// A replacement must be a legal transition from the stored status and
    /// passes the same post-state checks as [`Self::compare_and_transition`].
    pub fn upsert(&self, lease: Lease) -> Result<(), LeaseStoreError> {
        let mut state = self.state.write();
        if state.archived.contains(&lease.lease_id) {
            return Err(LeaseStoreError::Archived(lease.lease_id));
        }

        let active_before = state.count(LeaseStatus::Active);
        match state.leases.get(&lease.lease_id) {
            Some(current) => {
                if !current.status.can_transition_to(lease.status) {
                    return Err(LeaseStoreError::InvalidTransition {
                        lease_id: lease.lease_id,
                        from: current.status,
                        to: lease.status,
                    });
                }
                self.check_post_state(current, &lease, active_before)?;
            }
            None => {
                if lease.status.is_terminal() {
                    return Err(LeaseStoreError::Invariant {
                        lease_id: lease.lease_id,
                        reason: "cannot insert a terminal lease".to_string(),
                    });
                }
                self.check_new(&lease, active_before)?;
            }
        }

        trace!(lease_id = %lease.lease_id, status = %lease.status, "[sl-01] upsert");
        state.leases.insert(lease.lease_id.clone(), lease);
        Ok(())
    }

    /// Look up a lease by id.
    pub fn get(&self, lease_id: &LeaseId) -> Option<Lease> {
        self.state.read().leases.get(lease_id).cloned()
    }

    /// All leases with `status`, ascending by id.
    pub fn list_by_status(&self, status: LeaseStatus) -> Vec<Lease> {
        self.state
            .read()
            .leases
            .values()
            .filter(|l| l.status == status)
            .cloned()
            .collect()
    }

    /// Every stored lease, ascending by id.
    pub fn snapshot(&self) -> Vec<Lease> {
        self.state.read().leases.values().cloned().collect()
    }

    /// Number of `Active` leases.
    pub fn count_active(&self) -> usize {
        self.state.read().count(LeaseStatus::Active)
    }

    /// Number of stored leases per status. Every status is present.
    pub fn status_counts(&self) -> BTreeMap<LeaseStatus, usize> {
        let state = self.state.read();
        let mut counts: BTreeMap<LeaseStatus, usize> =
            LeaseStatus::ALL.iter().map(|s| (*s, 0)).collect();
        for lease in state.leases.values() {
            *counts.entry(lease.status).or_default() += 1;
        }
        counts
    }

    /// Total stake committed to `Active` and `Slashed` leases.
    pub fn committed_stake(&self) -> u64 {
        self.state
            .read()
            .leases
            .values()
            .filter(|l| matches!(l.status, LeaseStatus::Active | LeaseStatus::Slashed))
            .fold(0u64, |acc, l| acc.saturating_add(l.stake))
    }

    /// Whether `lease_id` was archived.
    pub fn is_archived(&self, lease_id: &LeaseId) -> bool {
        self.state.read().archived.contains(lease_id)
    }

    /// Atomically move `lease_id` from `expected` to `next`, applying
    /// `mutate` to a copy of the lease first.
    ///
    /// Fails with `Conflict` if the stored status is not `expected`. The
    /// returned lease is the committed post-state.
    pub fn compare_and_transition<F>(
        &self,
        lease_id: &LeaseId,
        expected: LeaseStatus,
        next: LeaseStatus,
        mutate: F,
    ) -> Result<Lease, LeaseStoreError>
    where
        F: FnOnce(&mut Lease),
    {
        let mut state = self.state.write();
        let active_before = state.count(LeaseStatus::Active);

        let current = state
            .leases
            .get(lease_id)
            .ok_or_else(|| LeaseStoreError::NotFound(lease_id.clone()))?;

        if current.status != expected {
            debug!(
                lease_id = %lease_id,
                expected = %expected,
                actual = %current.status,
                "[sl-01] compare-and-transition lost race"
            );
            return Err(LeaseStoreError::Conflict {
                lease_id: lease_id.clone(),
                expected,
                actual: current.status,
            });
        }
        if !expected.can_transition_to(next) {
            return Err(LeaseStoreError::InvalidTransition {
                lease_id: lease_id.clone(),
                from: expected,
                to: next,
            });
        }

        let mut candidate = current.clone();
        mutate(&mut candidate);
        candidate.status = next;
        self.check_post_state(current, &candidate, active_before)?;

        trace!(lease_id = %lease_id, from = %expected, to = %next, "[sl-01] transition");
        state.leases.insert(lease_id.clone(), candidate.clone());
        Ok(candidate)
    }

    /// Remove a terminal lease and remember its id so it is never
    /// re-inserted.
    pub fn remove_archived(&self, lease_id: &LeaseId) -> Result<Lease, LeaseStoreError> {
        let mut state = self.state.write();
        let status = state
            .leases
            .get(lease_id)
            .map(|l| l.status)
            .ok_or_else(|| LeaseStoreError::NotFound(lease_id.clone()))?;
        if !status.is_terminal() {
            return Err(LeaseStoreError::NotTerminal {
                lease_id: lease_id.clone(),
                status,
            });
        }
        state.archived.insert(lease_id.clone());
        state
            .leases
            .remove(lease_id)
            .ok_or_else(|| LeaseStoreError::NotFound(lease_id.clone()))
    }

    fn check_new(&self, lease: &Lease, active_before: usize) -> Result<(), LeaseStoreError> {
        self.check_stake_floor(lease)?;
        if lease.status == LeaseStatus::Active {
            self.check_activation(lease, active_before)?;
        }
        Ok(())
    }

    fn check_post_state(
        &self,
        current: &Lease,
        candidate: &Lease,
        active_before: usize,
    ) -> Result<(), LeaseStoreError> {
        let invariant = |reason: &str| LeaseStoreError::Invariant {
            lease_id: current.lease_id.clone(),
            reason: reason.to_string(),
        };

        if candidate.lease_id != current.lease_id {
            return Err(invariant("lease_id is immutable"));
        }
        if candidate.subnet_id != current.subnet_id {
            return Err(invariant("subnet_id is immutable"));
        }
        if current.status != LeaseStatus::Pending && candidate.stake > current.stake {
            return Err(invariant("stake can only increase while pending"));
        }
        if candidate.stake < current.stake
            && !matches!(candidate.status, LeaseStatus::Slashed | LeaseStatus::Terminated)
        {
            return Err(invariant("stake can only decrease through slashing"));
        }
        self.check_stake_floor(candidate)?;

        if candidate.status == LeaseStatus::Active {
            if current.status == LeaseStatus::Active {
                if !self.policy.stake_sufficient(candidate.stake) {
                    return Err(LeaseStoreError::InsufficientStake {
                        lease_id: candidate.lease_id.clone(),
                        stake: candidate.stake,
                        min_stake: self.policy.min_stake,
                    });
                }
            } else {
                self.check_activation(candidate, active_before)?;
            }
        }
        Ok(())
    }

    fn check_stake_floor(&self, lease: &Lease) -> Result<(), LeaseStoreError> {
        if lease.stake == 0 && lease.status != LeaseStatus::Terminated {
            return Err(LeaseStoreError::Invariant {
                lease_id: lease.lease_id.clone(),
                reason: "zero stake requires terminated status".to_string(),
            });
        }
        Ok(())
    }

    fn check_activation(&self, lease: &Lease, active_before: usize) -> Result<(), LeaseStoreError> {
        if !self.policy.has_capacity(active_before) {
            return Err(LeaseStoreError::CapacityExceeded {
                max_active: self.policy.max_active,
            });
        }
        if !self.policy.stake_sufficient(lease.stake) {
            return Err(LeaseStoreError::InsufficientStake {
                lease_id: lease.lease_id.clone(),
                stake: lease.stake,
                min_stake: self.policy.min_stake,
            });
        }
        Ok(())
    }
}

impl Default for LeaseStore {
    fn default() -> Self {
        Self::new(ActivationPolicy::default())
    }
}
