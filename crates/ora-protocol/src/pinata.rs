use async_trait::async_trait;
use bytes::Bytes;
use ora_store::{Capabilities, FetchScope, Operation, ProviderError, ProviderResult, StorageBackend};
use ora_types::Cid;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::auth::Credentials;
use crate::endpoint::{hosts, paths};
use crate::error::{ProtocolError, ProtocolResult};
use crate::http::{join_url, HttpOptions, HttpTransport};

/// pinata.cloud. Uploads go through `pinFileToIPFS`, which pins as a side
/// effect; pinning by hash is a paid feature and not offered.
#[derive(Debug)]
pub struct Pinata {
    api_url: String,
    gateway_url: String,
    credentials: Credentials,
    http: HttpTransport,
}

#[derive(Deserialize)]
struct PinFileResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

impl Pinata {
    pub fn new(jwt: &str, options: HttpOptions) -> ProtocolResult<Self> {
        Self::with_urls(jwt, hosts::PINATA_API, hosts::PINATA_GATEWAY, options)
    }

    pub fn with_urls(
        jwt: &str,
        api_url: &str,
        gateway_url: &str,
        options: HttpOptions,
    ) -> ProtocolResult<Self> {
        if jwt.is_empty() {
            return Err(ProtocolError::InvalidConfig("pinata JWT is empty".into()));
        }
        Ok(Self {
            api_url: api_url.to_string(),
            gateway_url: gateway_url.to_string(),
            credentials: Credentials::Bearer(jwt.to_string()),
            http: HttpTransport::new(options)?,
        })
    }
}

#[async_trait]
impl StorageBackend for Pinata {
    fn name(&self) -> &str {
        "pinata"
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

    async fn upload(&self, content: &[u8], name: Option<&str>) -> ProviderResult<Cid> {
        let url = join_url(&self.api_url, paths::PINATA_PIN_FILE);
        let file_name = name.unwrap_or("file").to_string();

        let resp = self
            .http
            .send(|c| {
                let part = Part::bytes(content.to_vec()).file_name(file_name.clone());
                self.credentials
                    .apply(c.post(&url))
                    .multipart(Form::new().part("file", part))
            })
            .await
            .map_err(ProtocolError::into_upload)?;

        let body: PinFileResponse = resp
            .json()
            .await
            .map_err(|e| ProtocolError::from(e).into_upload())?;
        Ok(Cid::parse(&body.ipfs_hash)?)
    }

    async fn pin(&self, _cid: &Cid) -> ProviderResult<()> {
        Err(ProviderError::Unsupported {
            provider: self.name().to_string(),
            operation: Operation::Pin,
        })
    }
}
