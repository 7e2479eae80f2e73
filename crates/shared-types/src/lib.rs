//! # Shared Types Crate
//!
//! This crate contains the lease entities, alert payloads and capability
//! ports shared by every subsystem of the validator node.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-subsystem types are defined here.
//! - **Ports, not transports**: Remote collaborators (main chain, subnet
//!   adapters, alert webhook) are async traits; the node runtime supplies
//!   the concrete JSON-RPC/HTTP adapters.
//! - **Monotone lifecycle**: `LeaseStatus::can_transition_to` is the only
//!   authority on which status changes are legal.
//!
//! ## Lease State Machine
//!
//! ```text
//! [PENDING] ──activate──→ [ACTIVE] ──expires──→ [EXPIRED]
//!     │                      │
//!     │ retracted            ├──slashed──→ [SLASHED] ──grace elapsed──→ [TERMINATED]
//!     ↓                      │                 │
//! [TERMINATED]               └──stake = 0──────┴──stake = 0──────────→ [TERMINATED]
//! ```

pub mod alerts;
pub mod entities;
pub mod errors;
pub mod ports;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use alerts::{Alert, AlertKind};
pub use entities::*;
pub use errors::{AlertError, RpcError};
pub use ports::{
    with_timeout, AlertPublisher, AlertSink, MainChainClient, SubnetAdapterClient,
    SubnetAdapters, SystemTimeSource, TimeSource,
};
