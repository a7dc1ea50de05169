use async_trait::async_trait;
use bytes::Bytes;
use ora_store::{Capabilities, FetchScope, ProviderResult, StorageBackend};
use ora_types::Cid;
use reqwest::header::USER_AGENT;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::auth::Credentials;
use crate::endpoint::{paths, UNIXFS_ADD_ARGS};
use crate::error::{ProtocolError, ProtocolResult};
use crate::http::{join_url, HttpOptions, HttpTransport};

/// Replication factor requested for every upload.
pub const REPLICATION: &str = "3";

const AGENT: &str = concat!("ora/", env!("CARGO_PKG_VERSION"));

/// Operator-run pinning cluster behind a bearer token.
///
/// Uploads are pinned and replicated by the cluster itself. The node only
/// serves content it stored, not the wider network.
#[derive(Debug)]
pub struct PinningNode {
    name: String,
    host: String,
    credentials: Credentials,
    http: HttpTransport,
}

#[derive(Deserialize)]
struct AddResponse {
    cid: String,
}

impl PinningNode {
    pub fn new(host: &str, token: &str, options: HttpOptions) -> ProtocolResult<Self> {
        if token.is_empty() {
            return Err(ProtocolError::InvalidConfig("pinning node token is empty".into()));
        }
        Ok(Self {
            name: format!("pinning-node({host})"),
            host: host.to_string(),
            credentials: Credentials::Bearer(token.to_string()),
            http: HttpTransport::new(options)?,
        })
    }
}

#[async_trait]
impl StorageBackend for PinningNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            fetch: true,
            upload: true,
            pin: true,
            pins_on_upload: true,
            fetch_scope: FetchScope::OwnUploads,
        }
    }

    async fn fetch(&self, cid: &Cid) -> ProviderResult<Bytes> {
        let url = join_url(&self.host, &format!("{}/{cid}", paths::IPFS));
        let resp = self
            .http
            .send(|c| self.credentials.apply(c.get(&url)).header(USER_AGENT, AGENT))
            .await
            .map_err(|e| e.into_fetch(cid))?;
        resp.bytes()
            .await
            .map_err(|e| ProtocolError::from(e).into_fetch(cid))
    }

    async fn upload(&self, content: &[u8], name: Option<&str>) -> ProviderResult<Cid> {
        let url = join_url(&self.host, paths::PINNING_NODE_ADD);
        let file_name = name.unwrap_or("file");
        let mut params: Vec<(&str, &str)> = UNIXFS_ADD_ARGS.to_vec();
        params.extend([
            ("name", file_name),
            ("replication-min", REPLICATION),
            ("replication-max", REPLICATION),
        ]);

        let resp = self
            .http
            .send(|c| {
                let part = Part::bytes(content.to_vec()).file_name(file_name.to_string());
                self.credentials
                    .apply(c.post(&url))
                    .header(USER_AGENT, AGENT)
                    .query(&params)
                    .multipart(Form::new().part("file", part))
            })
            .await
            .map_err(ProtocolError::into_upload)?;

        let body: AddResponse = resp
            .json()
            .await
            .map_err(|e| ProtocolError::from(e).into_upload())?;
        Ok(Cid::parse(&body.cid)?)
    }

    async fn pin(&self, _cid: &Cid) -> ProviderResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fast, serve};
    use axum::extract::{Multipart, Path, Query, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use ora_crypto::compute_cid;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    type Stored = Arc<Mutex<HashMap<String, Vec<u8>>>>;

    fn authorized(headers: &HeaderMap) -> bool {
        headers.get("authorization").and_then(|v| v.to_str().ok()) == Some("Bearer token")
    }

    fn node(stored: Stored) -> Router {
        Router::new()
            .route(
                "/ipfs/:cid",
                get(
                    |State(stored): State<Stored>, headers: HeaderMap, Path(cid): Path<String>| async move {
                        if !authorized(&headers) {
                            return StatusCode::UNAUTHORIZED.into_response();
                        }
                        match stored.lock().unwrap().get(&cid) {
                            Some(data) => data.clone().into_response(),
                            None => StatusCode::NOT_FOUND.into_response(),
                        }
                    },
                ),
            )
            .route(
                "/add",
                post(
                    |State(stored): State<Stored>,
                     headers: HeaderMap,
                     Query(args): Query<HashMap<String, String>>,
                     mut form: Multipart| async move {
                        if !authorized(&headers) {
                            return StatusCode::UNAUTHORIZED.into_response();
                        }
                        assert_eq!(args["replication-min"], "3");
                        assert_eq!(args["chunker"], "size-262144");
                        let data = form.next_field().await.unwrap().unwrap().bytes().await.unwrap();
                        let cid = compute_cid(&data).unwrap().to_string();
                        stored.lock().unwrap().insert(cid.clone(), data.to_vec());
                        Json(serde_json::json!({ "cid": cid })).into_response()
                    },
                ),
            )
            .with_state(stored)
    }

    #[tokio::test]
    async fn serves_only_own_uploads() {
        let base = serve(node(Stored::default())).await;
        let node = PinningNode::new(&base, "token", fast(0)).unwrap();

        let cid = node.upload(b"report", Some("report.json")).await.unwrap();
        assert_eq!(cid, compute_cid(b"report").unwrap());
        assert_eq!(&node.fetch(&cid).await.unwrap()[..], b"report");

        let foreign = compute_cid(b"uploaded elsewhere").unwrap();
        assert!(node.fetch(&foreign).await.is_err());
        assert_eq!(node.capabilities().fetch_scope, FetchScope::OwnUploads);
    }

    #[tokio::test]
    async fn pin_is_noop() {
        let node = PinningNode::new("http://127.0.0.1:1", "token", fast(0)).unwrap();
        node.pin(&Cid::v0([0; 32])).await.unwrap();
    }

    #[test]
    fn empty_token_rejected() {
        assert!(PinningNode::new("http://node", "", HttpOptions::default()).is_err());
    }
}
