//! Pure bookkeeping for the manager cycle.

pub mod activation;
pub mod report;

pub use activation::{ActivationTracker, FailureOutcome, MAX_BACKOFF_EXPONENT};
pub use report::CycleReport;
