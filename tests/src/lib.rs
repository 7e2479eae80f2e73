//! # Security-Leasing Test Suite
//!
//! Cross-subsystem scenarios that no single crate can cover on its own.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── race.rs       # Manager and monitor writing the same lease concurrently
//!     ├── lifecycle.rs  # Pending → Active → Slashed → Terminated → archived
//!     └── node.rs       # ValidatorNode booted from a YAML file
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p sl-tests
//! cargo test -p sl-tests integration::race::
//! ```

pub mod integration;
