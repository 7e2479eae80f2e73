//! # SL-02 Lease Manager
//!
//! **Subsystem ID:** 2
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Reconciles the local lease table with the main chain's view and enforces
//! activation and expiration policy. Runs its own poll loop, independent of
//! the monitor; the two only meet in the shared `LeaseStore`.
//!
//! ## Lifecycle Transitions Owned Here
//!
//! ```text
//! (fetched) ──insert──→ [Pending] ──activate──→ [Active] ──expire──→ [Expired]
//!                           │
//!                           └──retracted──→ [Terminated] ←──grace elapsed── [Slashed]
//! ```
//!
//! | Transition | Trigger |
//! |------------|---------|
//! | insert `Pending` | descriptor not yet in the store |
//! | `Pending → Pending` | descriptor reports a different stake (top-up) |
//! | `Pending → Active` | `auto_activate`, capacity, `stake >= min_stake`, `ActivateLease` ok |
//! | `Pending → Terminated` | absent from a successful `FetchPendingLeases` |
//! | `Active → Expired` | `expires_at <= now` |
//! | `Slashed → Terminated` | `slashed_at + grace <= now` |
//!
//! ## Standing Alerts
//!
//! | Kind | Raised |
//! |------|--------|
//! | `activation-failed` | once, after `activation_retry_limit` consecutive failures |
//! | `pending-stuck` | once per lease, after `pending_alert_after` |
//! | `over-leased` | once per crossing of balance below committed stake |
//!
//! ## Outbound Dependencies
//!
//! | Port | Purpose |
//! |------|---------|
//! | `MainChainClient` | pending leases and stake balance |
//! | `SubnetAdapterClient` | `ActivateLease` |
//! | `AlertPublisher` | standing alerts |
//! | `LeaseArchive` (optional) | terminal lease persistence |

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod domain;
pub mod service;

pub use config::LeaseManagerConfig;
pub use domain::{ActivationTracker, CycleReport};
pub use service::LeaseManager;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
