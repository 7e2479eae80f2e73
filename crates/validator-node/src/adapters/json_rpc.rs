//! JSON-RPC 2.0 over HTTP.

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use shared_types::RpcError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a, P> {
    jsonrpc: &'static str,
    method: &'a str,
    params: P,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<JsonRpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcErrorObject {
    code: i64,
    message: String,
}

/// Minimal JSON-RPC client bound to one endpoint.
pub struct JsonRpcClient {
    client: Client,
    endpoint: String,
    request_id: AtomicU64,
}

impl JsonRpcClient {
    /// `timeout` bounds each whole request.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, RpcError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| RpcError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            request_id: AtomicU64::new(1),
        })
    }

    /// Endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn next_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Call `method` and decode its `result`.
    pub async fn call<P, R>(&self, method: &str, params: P) -> Result<R, RpcError>
    where
        P: Serialize + Send,
        R: DeserializeOwned,
    {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: self.next_id(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    RpcError::Transport(format!("cannot connect to {}", self.endpoint))
                } else {
                    RpcError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RpcError::Transport(format!("{method}: HTTP {status}")));
        }

        let body: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| RpcError::InvalidResponse(format!("{method}: {e}")))?;

        decode(method, body)
    }
}

fn decode<R: DeserializeOwned>(method: &str, body: JsonRpcResponse) -> Result<R, RpcError> {
    if let Some(error) = body.error {
        return Err(RpcError::Remote {
            code: error.code,
            message: error.message,
        });
    }

    // A missing result decodes as null so unit-returning methods work.
    let result = body.result.unwrap_or(serde_json::Value::Null);
    serde_json::from_value(result).map_err(|e| RpcError::InvalidResponse(format!("{method}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::test_server;
    use serde_json::json;

    fn response(value: serde_json::Value) -> JsonRpcResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_decode_result() {
        let balance: u64 = decode("m", response(json!({"jsonrpc": "2.0", "id": 1, "result": 42}))).unwrap();
        assert_eq!(balance, 42);
    }

    #[test]
    fn test_decode_null_result_as_unit() {
        let unit: Result<(), _> = decode("m", response(json!({"jsonrpc": "2.0", "id": 1, "result": null})));
        assert!(unit.is_ok());
        let unit: Result<(), _> = decode("m", response(json!({"jsonrpc": "2.0", "id": 1})));
        assert!(unit.is_ok());
    }

    #[test]
    fn test_decode_error_object() {
        let err = decode::<u64>(
            "m",
            response(json!({"jsonrpc": "2.0", "id": 1, "error": {"code": -32601, "message": "method not found"}})),
        )
        .unwrap_err();
        assert_eq!(
            err,
            RpcError::Remote {
                code: -32601,
                message: "method not found".to_string()
            }
        );
    }

    #[test]
    fn test_decode_wrong_shape() {
        let err = decode::<u64>("m", response(json!({"jsonrpc": "2.0", "id": 1, "result": "many"}))).unwrap_err();
        assert!(matches!(err, RpcError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_call_sends_json_rpc_envelope() {
        let server = test_server::spawn(vec![test_server::ok(json!(7))]).await;
        let client = JsonRpcClient::new(server.url(), Duration::from_secs(5)).unwrap();

        let value: u64 = client.call("lease_stakeBalance", ["0xv"]).await.unwrap();
        assert_eq!(value, 7);

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0]["jsonrpc"], "2.0");
        assert_eq!(requests[0]["method"], "lease_stakeBalance");
        assert_eq!(requests[0]["params"], json!(["0xv"]));
        assert_eq!(requests[0]["id"], 1);
    }

    #[tokio::test]
    async fn test_http_error_status_is_transport_error() {
        let server = test_server::spawn(vec![(503, "unavailable".to_string())]).await;
        let client = JsonRpcClient::new(server.url(), Duration::from_secs(5)).unwrap();

        let err = client.call::<_, u64>("lease_stakeBalance", ["0xv"]).await.unwrap_err();
        assert!(matches!(err, RpcError::Transport(msg) if msg.contains("503")));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let endpoint = test_server::closed_endpoint().await;
        let client = JsonRpcClient::new(endpoint, Duration::from_secs(2)).unwrap();

        let err = client.call::<_, u64>("lease_stakeBalance", ["0xv"]).await.unwrap_err();
        assert!(matches!(err, RpcError::Transport(_)));
    }
}
