//! # Activation Policy
//!
//! Stake threshold and lease cap enforced by the store on every entry into
//! `Active`.

/// Stake threshold and lease cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivationPolicy {
    /// Maximum number of `Active` leases.
    pub max_active: usize,
    /// Minimum stake for a lease to become or remain `Active`.
    pub min_stake: u64,
}

impl ActivationPolicy {
    /// Create a policy.
    pub fn new(max_active: usize, min_stake: u64) -> Self {
        Self { max_active, min_stake }
    }

    /// Whether `stake` meets the minimum.
    pub fn stake_sufficient(&self, stake: u64) -> bool {
        stake >= self.min_stake
    }

    /// Whether another lease fits given `active` current leases.
    pub fn has_capacity(&self, active: usize) -> bool {
        active < self.max_active
    }
}

impl Default for ActivationPolicy {
    fn default() -> Self {
        Self {
            max_active: 10,
            min_stake: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_is_strict() {
        let policy = ActivationPolicy::new(2, 100);
        assert!(policy.has_capacity(1));
        assert!(!policy.has_capacity(2));
    }

    #[test]
    fn test_stake_threshold_is_inclusive() {
        let policy = ActivationPolicy::new(2, 100);
        assert!(policy.stake_sufficient(100));
        assert!(!policy.stake_sufficient(99));
    }
}
