//! # SL-01 Lease Store
//!
//! Authoritative in-memory table of `Lease` entities, shared by the lease
//! manager and the monitor.
//!
//! **Subsystem ID:** 1
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! The store is the only state shared across the two polling tasks. Every
//! mutation funnels through [`LeaseStore::compare_and_transition`], which
//! checks the caller's expected status under the write lock, so when the
//! manager expires a lease at the same instant the monitor slashes it,
//! exactly one of them wins and the other gets `LeaseStoreError::Conflict`.
//!
//! ## Invariants Enforced Here
//!
//! | Invariant | Check |
//! |-----------|-------|
//! | Unique `lease_id` | map key |
//! | `lease_id`, `subnet_id` immutable | rejected in mutate |
//! | `stake == 0` ⇒ `Terminated` | post-state check |
//! | `count(Active) <= max_active` | checked on entry into `Active` |
//! | `Active` ⇒ `stake >= min_stake` | post-state check |
//! | Monotone status | `LeaseStatus::can_transition_to` |
//! | Stake only decreases outside `Pending` | post-state check |
//!
//! ## Module Structure
//!
//! ```text
//! sl-01-lease-store/
//! ├── error.rs     # LeaseStoreError, ArchiveError
//! ├── policy.rs    # ActivationPolicy
//! ├── ports.rs     # LeaseArchive (external persistence hook)
//! └── store.rs     # LeaseStore
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod policy;
pub mod ports;
pub mod store;

pub use error::{ArchiveError, LeaseStoreError};
pub use policy::ActivationPolicy;
pub use ports::{InMemoryArchive, LeaseArchive};
pub use store::LeaseStore;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
