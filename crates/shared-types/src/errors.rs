//! # Shared Error Types
//!
//! Failures returned by the capability ports. Every variant is transient
//! from the core's point of view: callers log, count and retry next cycle.

use crate::entities::SubnetId;
use thiserror::Error;

/// Remote call failure (main chain or subnet adapter).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpcError {
    /// The call did not complete within its deadline.
    #[error("{operation} timed out after {after_ms}ms")]
    Timeout {
        /// Operation name, e.g. `fetch_lease_status`.
        operation: &'static str,
        /// Deadline that elapsed.
        after_ms: u64,
    },

    /// Connection or HTTP-level failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The remote returned a JSON-RPC error object.
    #[error("rpc error {code}: {message}")]
    Remote {
        /// JSON-RPC error code.
        code: i64,
        /// JSON-RPC error message.
        message: String,
    },

    /// The response could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// No adapter is configured for the subnet.
    #[error("no adapter configured for subnet {0}")]
    UnknownSubnet(SubnetId),
}

impl RpcError {
    /// Whether this failure was a deadline expiry.
    pub fn is_timeout(&self) -> bool {
        matches!(self, RpcError::Timeout { .. })
    }
}

/// Alert delivery failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlertError {
    /// The webhook could not be reached.
    #[error("alert delivery failed: {0}")]
    Delivery(String),

    /// The webhook answered with a non-success status.
    #[error("alert rejected with HTTP status {0}")]
    Rejected(u16),

    /// Delivery did not complete within its deadline.
    #[error("alert delivery timed out")]
    Timeout,
}
