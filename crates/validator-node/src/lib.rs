//! # Validator Node Library
//!
//! Composition root of the security-leasing validator. The `validator-node`
//! binary is a thin shell around [`ValidatorNode`]; everything it wires is
//! exposed here for testing.
//!
//! ## Layout
//!
//! - `config` - YAML configuration, validation and environment overrides
//! - `adapters` - JSON-RPC main chain and subnet clients, alert sinks
//! - `runtime` - [`ValidatorNode`]: store, dispatcher, manager and monitor tasks

#![warn(clippy::all)]

pub mod adapters;
pub mod config;
pub mod runtime;

pub use config::{ConfigError, NodeConfig};
pub use runtime::{NodeDeps, NodeError, ValidatorNode};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
