//! Per-lease monitoring state.

pub mod report;
pub mod watch;

pub use report::MonitorReport;
pub use watch::{FailureCount, WatchTable};
