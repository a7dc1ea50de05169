use std::time::Duration;

use async_trait::async_trait;
use ora_types::ChainId;
use reqwest::Client;
use serde::Deserialize;

use crate::endpoint::paths;
use crate::error::{ProtocolError, ProtocolResult};
use crate::http::join_url;

/// A backend that can report which network it serves.
#[async_trait]
pub trait NetworkIdentity: Send + Sync {
    /// Identity for logs and error reports.
    fn endpoint(&self) -> &str;

    /// Query the chain id. One request, no retry.
    async fn chain_id(&self) -> ProtocolResult<ChainId>;
}

#[async_trait]
impl<T: NetworkIdentity + ?Sized> NetworkIdentity for Box<T> {
    fn endpoint(&self) -> &str {
        (**self).endpoint()
    }

    async fn chain_id(&self) -> ProtocolResult<ChainId> {
        (**self).chain_id().await
    }
}

#[async_trait]
impl<T: NetworkIdentity + ?Sized> NetworkIdentity for std::sync::Arc<T> {
    fn endpoint(&self) -> &str {
        (**self).endpoint()
    }

    async fn chain_id(&self) -> ProtocolResult<ChainId> {
        (**self).chain_id().await
    }
}

fn client(timeout: Duration) -> ProtocolResult<Client> {
    Ok(Client::builder().timeout(timeout).build()?)
}

async fn get_json<T: serde::de::DeserializeOwned>(client: &Client, url: &str) -> ProtocolResult<T> {
    let resp = client.get(url).send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(ProtocolError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(resp.json().await?)
}

/// Execution-layer JSON-RPC node (`eth_chainId`).
#[derive(Clone, Debug)]
pub struct ExecutionRpc {
    url: String,
    client: Client,
}

#[derive(Deserialize)]
struct RpcResponse {
    result: Option<String>,
    error: Option<serde_json::Value>,
}

impl ExecutionRpc {
    pub fn new(url: &str, timeout: Duration) -> ProtocolResult<Self> {
        Ok(Self {
            url: url.to_string(),
            client: client(timeout)?,
        })
    }
}

#[async_trait]
impl NetworkIdentity for ExecutionRpc {
    fn endpoint(&self) -> &str {
        &self.url
    }

    async fn chain_id(&self) -> ProtocolResult<ChainId> {
        let resp = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({
                "jsonrpc": "2.0",
                "method": "eth_chainId",
                "params": [],
                "id": 1
            }))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ProtocolError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let body: RpcResponse = resp.json().await?;
        if let Some(err) = body.error {
            return Err(ProtocolError::InvalidResponse(format!("rpc error: {err}")));
        }
        let quantity = body
            .result
            .ok_or_else(|| ProtocolError::InvalidResponse("eth_chainId returned no result".into()))?;
        ChainId::from_hex_quantity(&quantity).map_err(|e| ProtocolError::InvalidResponse(e.to_string()))
    }
}

/// Consensus-layer beacon node (`/eth/v1/config/deposit_contract`).
#[derive(Clone, Debug)]
pub struct BeaconNode {
    url: String,
    client: Client,
}

#[derive(Deserialize)]
struct DepositContract {
    data: DepositContractData,
}

#[derive(Deserialize)]
struct DepositContractData {
    chain_id: String,
}

impl BeaconNode {
    pub fn new(url: &str, timeout: Duration) -> ProtocolResult<Self> {
        Ok(Self {
            url: url.to_string(),
            client: client(timeout)?,
        })
    }
}

#[async_trait]
impl NetworkIdentity for BeaconNode {
    fn endpoint(&self) -> &str {
        &self.url
    }

    async fn chain_id(&self) -> ProtocolResult<ChainId> {
        let url = join_url(&self.url, paths::BEACON_DEPOSIT_CONTRACT);
        let body: DepositContract = get_json(&self.client, &url).await?;
        ChainId::from_decimal(&body.data.chain_id)
            .map_err(|e| ProtocolError::InvalidResponse(e.to_string()))
    }
}

/// Keys API service (`/v1/status`).
#[derive(Clone, Debug)]
pub struct KeysApi {
    url: String,
    client: Client,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeysApiStatus {
    chain_id: u64,
}

impl KeysApi {
    pub fn new(url: &str, timeout: Duration) -> ProtocolResult<Self> {
        Ok(Self {
            url: url.to_string(),
            client: client(timeout)?,
        })
    }
}

#[async_trait]
impl NetworkIdentity for KeysApi {
    fn endpoint(&self) -> &str {
        &self.url
    }

    async fn chain_id(&self) -> ProtocolResult<ChainId> {
        let url = join_url(&self.url, paths::KEYS_API_STATUS);
        let body: KeysApiStatus = get_json(&self.client, &url).await?;
        Ok(ChainId(body.chain_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::serve;
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn execution_parses_hex() {
        let app = Router::new().route(
            "/",
            post(|Json(req): Json<serde_json::Value>| async move {
                assert_eq!(req["method"], "eth_chainId");
                Json(serde_json::json!({ "jsonrpc": "2.0", "id": 1, "result": "0x4268" }))
            }),
        );
        let base = serve(app).await;
        let rpc = ExecutionRpc::new(&format!("{base}/"), TIMEOUT).unwrap();
        assert_eq!(rpc.chain_id().await.unwrap(), ChainId(17000));
    }

    #[tokio::test]
    async fn execution_rpc_error() {
        let app = Router::new().route(
            "/",
            post(|| async {
                Json(serde_json::json!({
                    "jsonrpc": "2.0", "id": 1,
                    "error": { "code": -32601, "message": "method not found" }
                }))
            }),
        );
        let base = serve(app).await;
        let rpc = ExecutionRpc::new(&format!("{base}/"), TIMEOUT).unwrap();
        assert!(matches!(
            rpc.chain_id().await.unwrap_err(),
            ProtocolError::InvalidResponse(_)
        ));
    }

    #[tokio::test]
    async fn beacon_parses_decimal() {
        let app = Router::new().route(
            "/eth/v1/config/deposit_contract",
            get(|| async {
                Json(serde_json::json!({
                    "data": { "chain_id": "1", "address": "0x00000000219ab540356cbb839cbe05303d7705fa" }
                }))
            }),
        );
        let base = serve(app).await;
        let beacon = BeaconNode::new(&base, TIMEOUT).unwrap();
        assert_eq!(beacon.chain_id().await.unwrap(), ChainId(1));
        assert_eq!(beacon.endpoint(), base);
    }

    #[tokio::test]
    async fn keys_api_reads_chain_id() {
        let app = Router::new().route(
            "/v1/status",
            get(|| async {
                Json(serde_json::json!({ "appVersion": "1.0.0", "chainId": 17000 }))
            }),
        );
        let base = serve(app).await;
        let keys = KeysApi::new(&base, TIMEOUT).unwrap();
        assert_eq!(keys.chain_id().await.unwrap(), ChainId(17000));
    }

    #[tokio::test]
    async fn failure_status_is_not_retried() {
        let app = Router::new().route("/v1/status", get(|| async { StatusCode::SERVICE_UNAVAILABLE }));
        let base = serve(app).await;
        let keys = KeysApi::new(&base, TIMEOUT).unwrap();
        assert!(matches!(
            keys.chain_id().await.unwrap_err(),
            ProtocolError::Status { status: 503, .. }
        ));
    }
}
