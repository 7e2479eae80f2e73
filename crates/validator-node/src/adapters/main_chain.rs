use super::json_rpc::JsonRpcClient;
use async_trait::async_trait;
use shared_types::{LeaseDescriptor, MainChainClient, RpcError, ValidatorAddress};
use std::time::Duration;

/// Main chain over JSON-RPC (`lease_pendingLeases`, `lease_stakeBalance`).
pub struct JsonRpcMainChainClient {
    rpc: JsonRpcClient,
}

impl JsonRpcMainChainClient {
    /// Client for the node at `endpoint`.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, RpcError> {
        Ok(Self {
            rpc: JsonRpcClient::new(endpoint, timeout)?,
        })
    }
}

#[async_trait]
impl MainChainClient for JsonRpcMainChainClient {
    async fn fetch_pending_leases(
        &self,
        address: &ValidatorAddress,
    ) -> Result<Vec<LeaseDescriptor>, RpcError> {
        self.rpc.call("lease_pendingLeases", [address.as_str()]).await
    }

    async fn fetch_stake_balance(&self, address: &ValidatorAddress) -> Result<u64, RpcError> {
        self.rpc.call("lease_stakeBalance", [address.as_str()]).await
    }
}
