//! # SL-03 Monitor
//!
//! **Subsystem ID:** 3
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Periodically verifies that every `Active` lease is healthy on its subnet
//! and detects slashing. Runs its own poll loop; shares nothing with the
//! lease manager except the `LeaseStore`.
//!
//! ## Transitions Owned Here
//!
//! | Transition | Trigger |
//! |------------|---------|
//! | `Active → Active` | healthy check, stamps `last_checked_at` |
//! | `Active → Slashed` | new slashing events, or subnet reports the lease inactive |
//! | `Slashed → Slashed` | further events inside the grace period |
//! | `Active/Slashed → Terminated` | slashing consumed all stake |
//!
//! Failed checks never change status: absence of evidence is not evidence
//! of slashing.
//!
//! ## Alerts
//!
//! | Kind | Raised |
//! |------|--------|
//! | `slashing` | one per applied event |
//! | `state-mismatch` | subnet reports an active lease inactive |
//! | `connectivity` | consecutive failures reach `failure_threshold` |
//! | `expiring-soon` | once per lease, inside `expiry_warning` |
//!
//! Delivery goes through [`AlertDispatcher`]: a bounded queue drained by a
//! worker that retries with exponential backoff. Monitoring never waits on
//! delivery.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod dispatcher;
pub mod domain;
pub mod service;

pub use config::{DispatcherConfig, MonitorConfig};
pub use dispatcher::AlertDispatcher;
pub use domain::{MonitorReport, WatchTable};
pub use service::Monitor;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
