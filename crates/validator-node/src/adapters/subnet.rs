use super::json_rpc::JsonRpcClient;
use crate::config::SubnetConfig;
use async_trait::async_trait;
use shared_types::{LeaseHealth, LeaseId, RpcError, SlashingEvent, SubnetAdapterClient, Timestamp};
use std::time::Duration;

/// Subnet adapter contract reached through the subnet's JSON-RPC node.
///
/// Every method passes the adapter address first so one endpoint can host
/// several adapters.
pub struct JsonRpcSubnetAdapter {
    rpc: JsonRpcClient,
    adapter_address: String,
    kind: String,
}

impl JsonRpcSubnetAdapter {
    /// Adapter at `adapter_address` behind `endpoint`.
    pub fn new(
        endpoint: impl Into<String>,
        adapter_address: impl Into<String>,
        kind: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RpcError> {
        Ok(Self {
            rpc: JsonRpcClient::new(endpoint, timeout)?,
            adapter_address: adapter_address.into(),
            kind: kind.into(),
        })
    }

    /// Build from a `subnets[]` entry.
    pub fn from_config(subnet: &SubnetConfig, timeout: Duration) -> Result<Self, RpcError> {
        Self::new(&subnet.rpc, &subnet.adapter_address, &subnet.kind, timeout)
    }

    /// Adapter flavour from the config.
    pub fn kind(&self) -> &str {
        &self.kind
    }
}

#[async_trait]
impl SubnetAdapterClient for JsonRpcSubnetAdapter {
    async fn fetch_lease_status(&self, lease_id: &LeaseId) -> Result<LeaseHealth, RpcError> {
        self.rpc
            .call("adapter_leaseStatus", (&self.adapter_address, lease_id))
            .await
    }

    async fn fetch_slashing_events(
        &self,
        lease_id: &LeaseId,
        since: Timestamp,
    ) -> Result<Vec<SlashingEvent>, RpcError> {
        self.rpc
            .call("adapter_slashingEvents", (&self.adapter_address, lease_id, since))
            .await
    }

    async fn activate_lease(&self, lease_id: &LeaseId) -> Result<(), RpcError> {
        self.rpc
            .call("adapter_activateLease", (&self.adapter_address, lease_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::test_server;
    use serde_json::json;

    async fn adapter(responses: Vec<(u16, String)>) -> (JsonRpcSubnetAdapter, test_server::TestServer) {
        let server = test_server::spawn(responses).await;
        let adapter = JsonRpcSubnetAdapter::new(server.url(), "0xadapter", "evm", Duration::from_secs(5)).unwrap();
        (adapter, server)
    }

    #[tokio::test]
    async fn test_fetch_lease_status() {
        let (adapter, server) = adapter(vec![test_server::ok(json!({"active": false}))]).await;

        let health = adapter.fetch_lease_status(&LeaseId::new("L1")).await.unwrap();

        assert!(!health.active);
        assert_eq!(server.requests()[0]["method"], "adapter_leaseStatus");
        assert_eq!(server.requests()[0]["params"], json!(["0xadapter", "L1"]));
    }

    #[tokio::test]
    async fn test_fetch_slashing_events_passes_since() {
        let (adapter, server) = adapter(vec![test_server::ok(json!([
            {"reference": "ev-1", "lease_id": "L1", "amount": 50, "occurred_at": 1200, "reason": "downtime"}
        ]))])
        .await;

        let events = adapter
            .fetch_slashing_events(&LeaseId::new("L1"), Timestamp::new(1000))
            .await
            .unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].amount, 50);
        assert_eq!(events[0].reason.as_deref(), Some("downtime"));
        assert_eq!(server.requests()[0]["params"], json!(["0xadapter", "L1", 1000]));
    }

    #[tokio::test]
    async fn test_activate_lease() {
        let (adapter, server) = adapter(vec![test_server::ok(json!(null))]).await;

        adapter.activate_lease(&LeaseId::new("L1")).await.unwrap();
        assert_eq!(server.requests()[0]["method"], "adapter_activateLease");
    }

    #[tokio::test]
    async fn test_activate_lease_remote_error() {
        let body = json!({"jsonrpc": "2.0", "id": 1, "error": {"code": -32000, "message": "insufficient bond"}});
        let (adapter, _server) = adapter(vec![(200, body.to_string())]).await;

        let err = adapter.activate_lease(&LeaseId::new("L1")).await.unwrap_err();
        assert!(matches!(err, RpcError::Remote { code: -32000, .. }));
    }
}
