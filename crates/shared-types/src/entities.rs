//! # Core Domain Entities
//!
//! Defines the lease entity and the identifiers and remote payloads that
//! reference it.
//!
//! ## Clusters
//!
//! - **Identity**: `LeaseId`, `SubnetId`, `ValidatorAddress`
//! - **Lifecycle**: `Lease`, `LeaseStatus`, `Timestamp`
//! - **Remote payloads**: `LeaseDescriptor`, `LeaseHealth`, `SlashingEvent`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new identifier.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Borrow the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Globally unique lease identifier, immutable after creation.
    ///
    /// Ordering is lexicographic; activation order and store listings rely on it.
    LeaseId
);

string_id!(
    /// Identifies the subnet a lease secures.
    SubnetId
);

string_id!(
    /// Address of this validator on the main chain.
    ValidatorAddress
);

// =============================================================================
// CLUSTER B: LIFECYCLE
// =============================================================================

/// Unix timestamp in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Maximum reasonable timestamp (year 9999).
    pub const MAX_REASONABLE: u64 = 253_402_300_799;

    /// Create a new timestamp, clamping to MAX_REASONABLE.
    pub fn new(secs: u64) -> Self {
        Self(secs.min(Self::MAX_REASONABLE))
    }

    /// Get the underlying seconds value.
    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// Add seconds (saturating at MAX_REASONABLE).
    pub fn add_secs(&self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs).min(Self::MAX_REASONABLE))
    }

    /// Add a duration, truncated to whole seconds.
    pub fn add_duration(&self, duration: Duration) -> Self {
        self.add_secs(duration.as_secs())
    }

    /// Seconds elapsed since `earlier` (0 if `earlier` is in the future).
    pub fn secs_since(&self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lease lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaseStatus {
    /// Assigned by the main chain, not yet activated on the subnet.
    Pending,
    /// Activated on the subnet and counted against `max_leases`.
    Active,
    /// Slashing detected; awaiting the grace period before termination.
    Slashed,
    /// Reached `expires_at` while active.
    Expired,
    /// Retracted, fully slashed, or past the slashing grace period.
    Terminated,
}

impl LeaseStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [LeaseStatus; 5] = [
        LeaseStatus::Pending,
        LeaseStatus::Active,
        LeaseStatus::Slashed,
        LeaseStatus::Expired,
        LeaseStatus::Terminated,
    ];

    /// Whether no further transition is possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, LeaseStatus::Expired | LeaseStatus::Terminated)
    }

    /// Whether `self → next` is a legal transition.
    ///
    /// Self-transitions on non-terminal statuses are attribute updates
    /// (stake top-up, health stamp, further slashing). Nothing ever
    /// returns to `Pending` from another status.
    pub fn can_transition_to(self, next: LeaseStatus) -> bool {
        use LeaseStatus::*;
        matches!(
            (self, next),
            (Pending, Pending)
                | (Pending, Active)
                | (Pending, Terminated)
                | (Active, Active)
                | (Active, Expired)
                | (Active, Slashed)
                | (Active, Terminated)
                | (Slashed, Slashed)
                | (Slashed, Terminated)
        )
    }

    /// Stable lowercase name used in logs, metrics and alerts.
    pub fn as_str(self) -> &'static str {
        match self {
            LeaseStatus::Pending => "pending",
            LeaseStatus::Active => "active",
            LeaseStatus::Slashed => "slashed",
            LeaseStatus::Expired => "expired",
            LeaseStatus::Terminated => "terminated",
        }
    }
}

impl fmt::Display for LeaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of staked security delegated to one subnet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lease {
    /// Unique identifier.
    pub lease_id: LeaseId,
    /// Subnet this lease secures.
    pub subnet_id: SubnetId,
    /// Committed stake. Only slashing lowers it once the lease left `Pending`.
    pub stake: u64,
    /// Current lifecycle status.
    pub status: LeaseStatus,
    /// Lease term, applied at activation.
    pub duration_secs: u64,
    /// When this node first saw the lease.
    pub created_at: Timestamp,
    /// Set on `Pending → Active`.
    pub activated_at: Option<Timestamp>,
    /// `activated_at + duration_secs`.
    pub expires_at: Option<Timestamp>,
    /// Most recent successful health check.
    pub last_checked_at: Option<Timestamp>,
    /// Most recent applied slashing.
    pub slashed_at: Option<Timestamp>,
}

impl Lease {
    /// Create a `Pending` lease from a main-chain descriptor.
    pub fn pending(descriptor: &LeaseDescriptor, default_duration: Duration, now: Timestamp) -> Self {
        Self {
            lease_id: descriptor.lease_id.clone(),
            subnet_id: descriptor.subnet_id.clone(),
            stake: descriptor.stake,
            status: LeaseStatus::Pending,
            duration_secs: descriptor
                .duration_secs
                .unwrap_or_else(|| default_duration.as_secs()),
            created_at: now,
            activated_at: None,
            expires_at: None,
            last_checked_at: None,
            slashed_at: None,
        }
    }

    /// Whether the lease term has run out at `now`.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        matches!(self.expires_at, Some(expires_at) if expires_at <= now)
    }

    /// Lower bound for the next slashing-events query.
    pub fn slashing_window_start(&self) -> Timestamp {
        self.last_checked_at
            .or(self.activated_at)
            .unwrap_or(self.created_at)
    }

    /// Stamp activation time and expiry.
    pub fn stamp_activation(&mut self, now: Timestamp) {
        self.activated_at = Some(now);
        self.expires_at = Some(now.add_secs(self.duration_secs));
    }
}

// =============================================================================
// CLUSTER C: REMOTE PAYLOADS
// =============================================================================

/// A lease assignment as reported by the main chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseDescriptor {
    /// Lease identifier.
    pub lease_id: LeaseId,
    /// Subnet the lease secures.
    pub subnet_id: SubnetId,
    /// Stake committed to the lease.
    pub stake: u64,
    /// Lease term in seconds, if the chain specifies one.
    #[serde(default)]
    pub duration_secs: Option<u64>,
}

/// Subnet-side view of a lease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseHealth {
    /// Whether the subnet considers the lease active.
    pub active: bool,
}

/// A slashing penalty reported by a subnet adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlashingEvent {
    /// Adapter-side event reference (tx hash, evidence id).
    pub reference: String,
    /// Slashed lease.
    pub lease_id: LeaseId,
    /// Stake removed by this event.
    pub amount: u64,
    /// When the subnet recorded the event.
    pub occurred_at: Timestamp,
    /// Optional human-readable cause.
    #[serde(default)]
    pub reason: Option<String>,
}
