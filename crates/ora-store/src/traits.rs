use async_trait::async_trait;
use bytes::Bytes;
use ora_types::Cid;
use serde::{Deserialize, Serialize};

use crate::error::{Operation, ProviderResult};

/// Which content a backend can serve.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FetchScope {
    /// Anything reachable on the storage network.
    #[default]
    Global,
    /// Only content this backend itself stored.
    OwnUploads,
}

/// What a storage backend can do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capabilities {
    pub fetch: bool,
    pub upload: bool,
    pub pin: bool,
    /// Upload already pins; a separate pin call is unnecessary.
    pub pins_on_upload: bool,
    pub fetch_scope: FetchScope,
}

impl Capabilities {
    /// Fetch, upload and pin, serving the whole network.
    pub const FULL: Self = Self {
        fetch: true,
        upload: true,
        pin: true,
        pins_on_upload: false,
        fetch_scope: FetchScope::Global,
    };

    /// Read-only gateway.
    pub const FETCH_ONLY: Self = Self {
        fetch: true,
        upload: false,
        pin: false,
        pins_on_upload: false,
        fetch_scope: FetchScope::Global,
    };

    pub fn supports(&self, operation: Operation) -> bool {
        match operation {
            Operation::Fetch => self.fetch,
            Operation::Upload => self.upload,
            Operation::Pin => self.pin,
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::FULL
    }
}

/// Vendor-specific access to one content-addressed storage backend.
///
/// Implementations only move bytes; integrity checks live in
/// [`Provider`](crate::Provider), which wraps every backend. Implementations
/// must not keep orchestration state.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Identity for logs and error reports, e.g. `kubo(http://10.0.0.1)`.
    fn name(&self) -> &str;

    fn capabilities(&self) -> Capabilities;

    /// Retrieve the bytes stored under `cid`.
    async fn fetch(&self, cid: &Cid) -> ProviderResult<Bytes>;

    /// Store `content` and return the identifier the vendor assigned.
    async fn upload(&self, content: &[u8], name: Option<&str>) -> ProviderResult<Cid>;

    /// Ask the backend to retain `cid`.
    async fn pin(&self, cid: &Cid) -> ProviderResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_supports_everything() {
        let caps = Capabilities::FULL;
        assert!(caps.supports(Operation::Fetch));
        assert!(caps.supports(Operation::Upload));
        assert!(caps.supports(Operation::Pin));
        assert_eq!(caps.fetch_scope, FetchScope::Global);
    }

    #[test]
    fn fetch_only_rejects_writes() {
        let caps = Capabilities::FETCH_ONLY;
        assert!(caps.supports(Operation::Fetch));
        assert!(!caps.supports(Operation::Upload));
        assert!(!caps.supports(Operation::Pin));
    }

    #[test]
    fn default_is_full() {
        assert_eq!(Capabilities::default(), Capabilities::FULL);
    }
}
