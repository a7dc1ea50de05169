use async_trait::async_trait;
use bytes::Bytes;
use ora_store::{Capabilities, Operation, ProviderError, ProviderResult, StorageBackend};
use ora_types::Cid;

use crate::endpoint::paths;
use crate::error::ProtocolResult;
use crate::http::{join_url, HttpOptions, HttpTransport};

/// Read-only public gateway such as `https://ipfs.io`.
#[derive(Debug)]
pub struct PublicGateway {
    name: String,
    url: String,
    http: HttpTransport,
}

impl PublicGateway {
    pub fn new(url: &str, options: HttpOptions) -> ProtocolResult<Self> {
        Ok(Self {
            name: format!("gateway({url})"),
            url: url.to_string(),
            http: HttpTransport::new(options)?,
        })
    }

    fn unsupported(&self, operation: Operation) -> ProviderError {
        ProviderError::Unsupported {
            provider: self.name.clone(),
            operation,
        }
    }
}

#[async_trait]
impl StorageBackend for PublicGateway {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::FETCH_ONLY
    }

    async fn fetch(&self, cid: &Cid) -> ProviderResult<Bytes> {
        let url = join_url(&self.url, &format!("{}/{cid}", paths::IPFS));
        self.http.get_bytes(&url).await.map_err(|e| e.into_fetch(cid))
    }

    async fn upload(&self, _content: &[u8], _name: Option<&str>) -> ProviderResult<Cid> {
        Err(self.unsupported(Operation::Upload))
    }

    async fn pin(&self, _cid: &Cid) -> ProviderResult<()> {
        Err(self.unsupported(Operation::Pin))
    }
}
