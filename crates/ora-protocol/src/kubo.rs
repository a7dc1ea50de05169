use async_trait::async_trait;
use bytes::Bytes;
use ora_store::{Capabilities, ProviderError, ProviderResult, StorageBackend};
use ora_types::Cid;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::endpoint::{paths, UNIXFS_ADD_ARGS};
use crate::error::{ProtocolError, ProtocolResult};
use crate::http::{join_url, HttpOptions, HttpTransport};

/// A self-hosted Kubo node: RPC API for writes, HTTP gateway for reads.
#[derive(Debug)]
pub struct Kubo {
    name: String,
    rpc_url: String,
    gateway_url: String,
    http: HttpTransport,
}

#[derive(Deserialize)]
struct AddResponse {
    #[serde(rename = "Hash")]
    hash: String,
}

#[derive(Deserialize)]
struct PinResponse {
    #[serde(rename = "Pins", default)]
    pins: Vec<String>,
}

impl Kubo {
    pub fn new(
        host: &str,
        rpc_port: u16,
        gateway_port: u16,
        options: HttpOptions,
    ) -> ProtocolResult<Self> {
        let host = host.trim_end_matches('/');
        Self::with_urls(
            &format!("{host}:{rpc_port}"),
            &format!("{host}:{gateway_port}"),
            options,
        )
    }

    /// Node with explicit RPC and gateway base URLs.
    pub fn with_urls(rpc_url: &str, gateway_url: &str, options: HttpOptions) -> ProtocolResult<Self> {
        Ok(Self {
            name: format!("kubo({rpc_url})"),
            rpc_url: rpc_url.to_string(),
            gateway_url: gateway_url.to_string(),
            http: HttpTransport::new(options)?,
        })
    }
}

#[async_trait]
impl StorageBackend for Kubo {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::FULL
    }

    async fn fetch(&self, cid: &Cid) -> ProviderResult<Bytes> {
        let url = join_url(&self.gateway_url, &format!("{}/{cid}", paths::IPFS));
        self.http.get_bytes(&url).await.map_err(|e| e.into_fetch(cid))
    }

    async fn upload(&self, content: &[u8], name: Option<&str>) -> ProviderResult<Cid> {
        let url = join_url(&self.rpc_url, paths::KUBO_ADD);
        let field = name.unwrap_or("file").to_string();

        let resp = self
            .http
            .send(|c| {
                let part = Part::bytes(content.to_vec()).file_name(field.clone());
                c.post(&url)
                    .query(&UNIXFS_ADD_ARGS[..])
                    .multipart(Form::new().part(field.clone(), part))
            })
            .await
            .map_err(ProtocolError::into_upload)?;

        let body: AddResponse = resp
            .json()
            .await
            .map_err(|e| ProtocolError::from(e).into_upload())?;
        Ok(Cid::parse(&body.hash)?)
    }

    async fn pin(&self, cid: &Cid) -> ProviderResult<()> {
        let url = join_url(&self.rpc_url, paths::KUBO_PIN_ADD);
        let arg = cid.to_string();

        let resp = self
            .http
            .send(|c| c.post(&url).query(&[("arg", arg.as_str())]))
            .await
            .map_err(|e| e.into_pin(cid))?;
        let body: PinResponse = resp
            .json()
            .await
            .map_err(|e| ProtocolError::from(e).into_pin(cid))?;

        match body.pins.first() {
            Some(pinned) if *pinned == arg => Ok(()),
            Some(pinned) => Err(ProviderError::Pin {
                cid: *cid,
                reason: format!("node pinned unexpected CID {pinned}"),
            }),
            None => Err(ProviderError::Pin {
                cid: *cid,
                reason: "empty pin list".into(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fast, serve};
    use axum::extract::{Multipart, Path, Query};
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use ora_crypto::compute_cid;
    use std::collections::HashMap;

    fn node() -> Router {
        Router::new()
            .route(
                "/ipfs/:cid",
                get(|Path(cid): Path<String>| async move {
                    if cid == compute_cid(b"hello world").unwrap().to_string() {
                        (StatusCode::OK, "hello world")
                    } else {
                        (StatusCode::NOT_FOUND, "")
                    }
                }),
            )
            .route(
                "/api/v0/add",
                post(
                    |Query(args): Query<HashMap<String, String>>, mut form: Multipart| async move {
                        assert_eq!(args["chunker"], "size-262144");
                        assert_eq!(args["cid-version"], "0");
                        assert_eq!(args["raw-leaves"], "false");
                        let field = form.next_field().await.unwrap().unwrap();
                        let data = field.bytes().await.unwrap();
                        Json(serde_json::json!({
                            "Name": "file",
                            "Hash": compute_cid(&data).unwrap().to_string(),
                            "Size": data.len().to_string(),
                        }))
                    },
                ),
            )
            .route(
                "/api/v0/pin/add",
                post(|Query(args): Query<HashMap<String, String>>| async move {
                    Json(serde_json::json!({ "Pins": [args["arg"].clone()] }))
                }),
            )
    }

    async fn kubo() -> Kubo {
        let base = serve(node()).await;
        Kubo::with_urls(&base, &base, fast(0)).unwrap()
    }

    #[test]
    fn name_includes_rpc_host() {
        let kubo = Kubo::new("http://10.0.0.5/", 5001, 8080, HttpOptions::default()).unwrap();
        assert_eq!(kubo.name(), "kubo(http://10.0.0.5:5001)");
    }

    #[tokio::test]
    async fn fetch_from_gateway() {
        let kubo = kubo().await;
        let cid = compute_cid(b"hello world").unwrap();
        assert_eq!(&kubo.fetch(&cid).await.unwrap()[..], b"hello world");
    }

    #[tokio::test]
    async fn fetch_missing_is_fetch_error() {
        let kubo = kubo().await;
        let cid = compute_cid(b"absent").unwrap();
        let err = kubo.fetch(&cid).await.unwrap_err();
        assert!(matches!(err, ProviderError::Fetch { cid: c, .. } if c == cid));
    }

    #[tokio::test]
    async fn upload_reads_hash() {
        let kubo = kubo().await;
        let cid = kubo.upload(b"report", Some("report.json")).await.unwrap();
        assert_eq!(cid, compute_cid(b"report").unwrap());
    }

    #[tokio::test]
    async fn pin_checks_echoed_cid() {
        let kubo = kubo().await;
        let cid = compute_cid(b"report").unwrap();
        kubo.pin(&cid).await.unwrap();
    }
}
