use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use bytes::Bytes;
use ora_store::{Capabilities, ProviderError, ProviderResult, StorageBackend};
use ora_types::Cid;
use reqwest::{Method, Response, Url};
use serde::Deserialize;

use crate::auth::RequestSigner;
use crate::endpoint::{hosts, paths};
use crate::error::{ProtocolError, ProtocolResult};
use crate::http::{join_url, HttpOptions, HttpTransport};

/// Response header carrying the CID of an upload.
pub const IPFS_HASH_HEADER: &str = "IPFS-Hash";

/// gw3.io. Every API call is HMAC signed; uploads are a two-step exchange
/// (ask for an upload URL, then post the body there).
#[derive(Debug)]
pub struct Gw3 {
    url: String,
    signer: RequestSigner,
    http: HttpTransport,
}

#[derive(Deserialize)]
struct UploadSlot {
    data: UploadSlotData,
}

#[derive(Deserialize)]
struct UploadSlotData {
    url: String,
}

impl Gw3 {
    pub fn new(access_key: &str, access_secret: &str, options: HttpOptions) -> ProtocolResult<Self> {
        Self::with_url(access_key, access_secret, hosts::GW3, options)
    }

    pub fn with_url(
        access_key: &str,
        access_secret: &str,
        url: &str,
        options: HttpOptions,
    ) -> ProtocolResult<Self> {
        Ok(Self {
            url: url.to_string(),
            signer: RequestSigner::new(access_key, access_secret)?,
            http: HttpTransport::new(options)?,
        })
    }

    /// Build the URL for a signed call and its signature. `params` are
    /// form-encoded in order, followed by `ts`; the signature covers the
    /// encoded query exactly as sent.
    fn sign_request(
        &self,
        method: &Method,
        path: &str,
        params: &[(&str, String)],
        ts: u64,
    ) -> ProtocolResult<(Url, String)> {
        let url = join_url(&self.url, path);
        let mut parsed = Url::parse(&url)
            .map_err(|e| ProtocolError::InvalidConfig(format!("bad gw3 url {url}: {e}")))?;
        parsed
            .query_pairs_mut()
            .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())))
            .append_pair("ts", &ts.to_string());

        let signature = self.signer.sign(
            method.as_str(),
            parsed.path(),
            parsed.query().unwrap_or_default(),
        )?;
        Ok((parsed, signature))
    }

    async fn send_signed(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
    ) -> ProtocolResult<Response> {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| ProtocolError::Signing(e.to_string()))?
            .as_secs();
        let (url, signature) = self.sign_request(&method, path, params, ts)?;

        self.http
            .send(|c| {
                c.request(method.clone(), url.clone())
                    .header("X-Access-Key", self.signer.access_key())
                    .header("X-Access-Signature", &signature)
            })
            .await
    }
}

#[async_trait]
impl StorageBackend for Gw3 {
    fn name(&self) -> &str {
        "gw3"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::FULL
    }

    async fn fetch(&self, cid: &Cid) -> ProviderResult<Bytes> {
        let path = format!("{}/{cid}", paths::IPFS);
        let resp = self
            .send_signed(Method::GET, &path, &[])
            .await
            .map_err(|e| e.into_fetch(cid))?;
        resp.bytes()
            .await
            .map_err(|e| ProtocolError::from(e).into_fetch(cid))
    }

    async fn upload(&self, content: &[u8], _name: Option<&str>) -> ProviderResult<Cid> {
        let path = format!("{}/", paths::IPFS);
        let slot: UploadSlot = self
            .send_signed(Method::POST, &path, &[("size", content.len().to_string())])
            .await
            .map_err(ProtocolError::into_upload)?
            .json()
            .await
            .map_err(|e| ProtocolError::from(e).into_upload())?;

        let resp = self
            .http
            .send(|c| c.post(&slot.data.url).body(content.to_vec()))
            .await
            .map_err(ProtocolError::into_upload)?;

        let hash = resp
            .headers()
            .get(IPFS_HASH_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ProviderError::Upload(format!("response has no {IPFS_HASH_HEADER} header")))?;
        Ok(Cid::parse(hash)?)
    }

    async fn pin(&self, cid: &Cid) -> ProviderResult<()> {
        self.send_signed(Method::POST, paths::KUBO_PIN_ADD, &[("arg", cid.to_string())])
            .await
            .map_err(|e| e.into_pin(cid))?;
        Ok(())
    }
}
