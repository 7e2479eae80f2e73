//! # Adapters
//!
//! Concrete implementations of the capability ports from `shared-types`:
//!
//! | Port | Adapter |
//! |------|---------|
//! | `MainChainClient` | [`JsonRpcMainChainClient`] |
//! | `SubnetAdapterClient` | [`JsonRpcSubnetAdapter`] |
//! | `AlertSink` | [`WebhookAlertSink`], or [`LogAlertSink`] when no webhook is set |

pub mod alert_sink;
pub mod json_rpc;
pub mod main_chain;
pub mod subnet;

pub use alert_sink::{LogAlertSink, WebhookAlertSink, WebhookPayload};
pub use json_rpc::JsonRpcClient;
pub use main_chain::JsonRpcMainChainClient;
pub use subnet::JsonRpcSubnetAdapter;
