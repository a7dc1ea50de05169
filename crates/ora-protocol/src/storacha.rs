use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use ora_crypto::{create_car, CarFile};
use ora_store::{Capabilities, FetchScope, Operation, ProviderError, ProviderResult, StorageBackend};
use ora_types::Cid;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::auth::Credentials;
use crate::endpoint::{hosts, paths};
use crate::error::{ProtocolError, ProtocolResult};
use crate::http::{join_url, HttpOptions, HttpTransport};

/// storacha.network through its HTTP bridge.
///
/// Uploads are packed into a CARv1 archive locally. `store/add` registers
/// the archive and may hand back a presigned URL to PUT it to; `upload/add`
/// then links the payload root to that shard in the space. Stored uploads
/// stay in the space, so pinning by hash is not offered.
#[derive(Debug)]
pub struct Storacha {
    bridge_url: String,
    gateway_url: String,
    space_did: String,
    credentials: Credentials,
    http: HttpTransport,
}

/// One invocation receipt from the bridge.
#[derive(Deserialize)]
struct Receipt<T> {
    p: ReceiptPayload<T>,
}

#[derive(Deserialize)]
struct ReceiptPayload<T> {
    out: Outcome<T>,
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum Outcome<T> {
    Ok(T),
    Error(serde_json::Value),
}

#[derive(Deserialize)]
struct StoreAdded {
    status: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    headers: HashMap<String, String>,
}

#[derive(Deserialize)]
struct UploadAdded {
    root: Link,
}

#[derive(Deserialize)]
struct Link {
    #[serde(rename = "/")]
    cid: String,
}

impl Storacha {
    pub fn new(
        auth_secret: &str,
        authorization: &str,
        space_did: &str,
        options: HttpOptions,
    ) -> ProtocolResult<Self> {
        Self::with_urls(
            auth_secret,
            authorization,
            space_did,
            hosts::STORACHA_BRIDGE,
            hosts::STORACHA_GATEWAY,
            options,
        )
    }

    pub fn with_urls(
        auth_secret: &str,
        authorization: &str,
        space_did: &str,
        bridge_url: &str,
        gateway_url: &str,
        options: HttpOptions,
    ) -> ProtocolResult<Self> {
        if auth_secret.is_empty() || authorization.is_empty() {
            return Err(ProtocolError::InvalidConfig("storacha credentials are empty".into()));
        }
        if !space_did.starts_with("did:") {
            return Err(ProtocolError::InvalidConfig(format!(
                "storacha space is not a DID: {space_did}"
            )));
        }
        Ok(Self {
            bridge_url: bridge_url.to_string(),
            gateway_url: gateway_url.to_string(),
            space_did: space_did.to_string(),
            credentials: Credentials::AuthSecret {
                secret: auth_secret.to_string(),
                authorization: authorization.to_string(),
            },
            http: HttpTransport::new(options)?,
        })
    }

    /// Run one capability on the bridge and return its `ok` value.
    async fn invoke<T: DeserializeOwned>(
        &self,
        ability: &str,
        args: serde_json::Value,
    ) -> ProtocolResult<T> {
        let url = join_url(&self.bridge_url, paths::STORACHA_BRIDGE);
        let body = json!({ "tasks": [[ability, self.space_did, args]] });

        let resp = self
            .http
            .send(|c| self.credentials.apply(c.post(&url)).json(&body))
            .await?;
        let receipts: Vec<Receipt<T>> = resp.json().await?;
        let receipt = receipts
            .into_iter()
            .next()
            .ok_or_else(|| ProtocolError::InvalidResponse(format!("{ability}: no receipt")))?;

        match receipt.p.out {
            Outcome::Ok(value) => Ok(value),
            Outcome::Error(error) => {
                tracing::warn!(ability, %error, "storacha invocation failed");
                Err(ProtocolError::InvalidResponse(format!("{ability} failed: {error}")))
            }
        }
    }

    /// PUT the archive to the presigned URL `store/add` returned.
    ///
    /// The URL carries a signature, so it is kept out of errors and logs.
    async fn put_shard(&self, added: &StoreAdded, car: &CarFile) -> ProtocolResult<()> {
        let url = added
            .url
            .as_deref()
            .ok_or_else(|| ProtocolError::InvalidResponse("store/add: upload without url".into()))?;
        let headers = header_map(&added.headers)?;
        let body = Bytes::from(car.bytes.clone());

        self.http
            .send(|c| c.put(url).headers(headers.clone()).body(body.clone()))
            .await
            .map_err(|e| match e {
                ProtocolError::Status { status, .. } => {
                    ProtocolError::InvalidResponse(format!("shard upload answered with status {status}"))
                }
                ProtocolError::Http(e) => ProtocolError::Http(e.without_url()),
                other => other,
            })?;
        tracing::debug!(shard = %car.shard, size = car.size(), "stored shard");
        Ok(())
    }
}

fn header_map(headers: &HashMap<String, String>) -> ProtocolResult<HeaderMap> {
    headers
        .iter()
        .map(|(name, value)| {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ProtocolError::InvalidResponse(format!("shard header name: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ProtocolError::InvalidResponse(format!("shard header value: {e}")))?;
            Ok((name, value))
        })
        .collect()
}

#[async_trait]
impl StorageBackend for Storacha {
    fn name(&self) -> &str {
        "storacha"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            fetch: true,
            upload: true,
            pin: false,
            pins_on_upload: true,
            fetch_scope: FetchScope::Global,
        }
    }

    async fn fetch(&self, cid: &Cid) -> ProviderResult<Bytes> {
        let url = join_url(&self.gateway_url, &format!("{}/{cid}", paths::IPFS));
        self.http.get_bytes(&url).await.map_err(|e| e.into_fetch(cid))
    }

    async fn upload(&self, content: &[u8], _name: Option<&str>) -> ProviderResult<Cid> {
        let car = create_car(content).map_err(|e| ProviderError::Upload(e.to_string()))?;

        let added: StoreAdded = self
            .invoke(
                "store/add",
                json!({ "link": { "/": car.shard.to_string() }, "size": car.size() }),
            )
            .await
            .map_err(ProtocolError::into_upload)?;
        if added.status == "upload" {
            self.put_shard(&added, &car)
                .await
                .map_err(ProtocolError::into_upload)?;
        }

        let linked: UploadAdded = self
            .invoke(
                "upload/add",
                json!({
                    "root": { "/": car.root.to_string() },
                    "shards": [{ "/": car.shard.to_string() }],
                }),
            )
            .await
            .map_err(ProtocolError::into_upload)?;
        Ok(Cid::parse(&linked.root.cid)?)
    }

    async fn pin(&self, _cid: &Cid) -> ProviderResult<()> {
        Err(ProviderError::Unsupported {
            provider: self.name().to_string(),
            operation: Operation::Pin,
        })
    }
}
