//! # Alert Payloads
//!
//! Structured alerts delivered to the operator webhook. Every alert carries
//! a machine-readable `kind` and a `detail` object so the receiver can parse
//! it without scraping the human message.

use crate::entities::{Lease, LeaseId, SlashingEvent, SubnetId, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;

/// Alert category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlertKind {
    /// Subnet adapter failed repeatedly; lease status unchanged.
    Connectivity,
    /// Subnet no longer considers an active lease active.
    StateMismatch,
    /// Slashing event applied to a lease.
    Slashing,
    /// Activation kept failing past the retry limit.
    ActivationFailed,
    /// Lease stayed pending past the configured bound.
    PendingStuck,
    /// Bonded balance no longer covers the stake committed to active leases.
    OverLeased,
    /// Active lease is about to expire.
    ExpiringSoon,
}

impl AlertKind {
    /// Stable kebab-case name, matching the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            AlertKind::Connectivity => "connectivity",
            AlertKind::StateMismatch => "state-mismatch",
            AlertKind::Slashing => "slashing",
            AlertKind::ActivationFailed => "activation-failed",
            AlertKind::PendingStuck => "pending-stuck",
            AlertKind::OverLeased => "over-leased",
            AlertKind::ExpiringSoon => "expiring-soon",
        }
    }

    /// Short operator-facing title.
    pub fn title(self) -> &'static str {
        match self {
            AlertKind::Connectivity => "Subnet adapter unreachable",
            AlertKind::StateMismatch => "Lease inactive on subnet",
            AlertKind::Slashing => "Lease slashed",
            AlertKind::ActivationFailed => "Lease activation failing",
            AlertKind::PendingStuck => "Lease stuck pending",
            AlertKind::OverLeased => "Stake balance below committed stake",
            AlertKind::ExpiringSoon => "Lease expiring soon",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alert payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Alert category.
    pub kind: AlertKind,
    /// Affected lease, if the alert is lease-scoped.
    pub lease_id: Option<LeaseId>,
    /// Affected subnet, if known.
    pub subnet_id: Option<SubnetId>,
    /// Kind-specific structured detail.
    pub detail: serde_json::Value,
    /// When the condition was detected.
    pub timestamp: Timestamp,
}

impl Alert {
    fn for_lease(kind: AlertKind, lease: &Lease, detail: serde_json::Value, now: Timestamp) -> Self {
        Self {
            kind,
            lease_id: Some(lease.lease_id.clone()),
            subnet_id: Some(lease.subnet_id.clone()),
            detail,
            timestamp: now,
        }
    }

    /// Consecutive adapter failures crossed the threshold.
    pub fn connectivity(lease: &Lease, consecutive_failures: u32, last_error: &str, now: Timestamp) -> Self {
        Self::for_lease(
            AlertKind::Connectivity,
            lease,
            json!({
                "consecutive_failures": consecutive_failures,
                "last_error": last_error,
            }),
            now,
        )
    }

    /// Subnet reports an active lease as inactive.
    pub fn state_mismatch(lease: &Lease, now: Timestamp) -> Self {
        Self::for_lease(
            AlertKind::StateMismatch,
            lease,
            json!({
                "local_status": lease.status.as_str(),
                "subnet_active": false,
            }),
            now,
        )
    }

    /// A slashing event was applied.
    pub fn slashing(lease: &Lease, event: &SlashingEvent, remaining_stake: u64, now: Timestamp) -> Self {
        Self::for_lease(
            AlertKind::Slashing,
            lease,
            json!({
                "amount_slashed": event.amount,
                "remaining_stake": remaining_stake,
                "event_reference": event.reference,
                "occurred_at": event.occurred_at.as_secs(),
                "reason": event.reason,
            }),
            now,
        )
    }

    /// Activation retries exhausted.
    pub fn activation_failed(lease: &Lease, attempts: u32, last_error: &str, now: Timestamp) -> Self {
        Self::for_lease(
            AlertKind::ActivationFailed,
            lease,
            json!({
                "attempts": attempts,
                "last_error": last_error,
            }),
            now,
        )
    }

    /// Lease pending for too long.
    pub fn pending_stuck(lease: &Lease, pending_secs: u64, now: Timestamp) -> Self {
        Self::for_lease(
            AlertKind::PendingStuck,
            lease,
            json!({
                "pending_secs": pending_secs,
                "stake": lease.stake,
            }),
            now,
        )
    }

    /// Active lease expires within the warning window.
    pub fn expiring_soon(lease: &Lease, expires_in_secs: u64, now: Timestamp) -> Self {
        Self::for_lease(
            AlertKind::ExpiringSoon,
            lease,
            json!({
                "expires_at": lease.expires_at.map(|t| t.as_secs()),
                "expires_in_secs": expires_in_secs,
            }),
            now,
        )
    }

    /// Bonded balance dropped below committed stake.
    pub fn over_leased(balance: u64, committed: u64, now: Timestamp) -> Self {
        Self {
            kind: AlertKind::OverLeased,
            lease_id: None,
            subnet_id: None,
            detail: json!({
                "stake_balance": balance,
                "committed_stake": committed,
                "shortfall": committed.saturating_sub(balance),
            }),
            timestamp: now,
        }
    }

    /// One-line human summary.
    pub fn message(&self) -> String {
        match (&self.lease_id, &self.subnet_id) {
            (Some(lease), Some(subnet)) => {
                format!("{}: lease {} on subnet {} ({})", self.kind.title(), lease, subnet, self.detail)
            }
            _ => format!("{} ({})", self.kind.title(), self.detail),
        }
    }
}
