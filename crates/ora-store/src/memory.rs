use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use bytes::Bytes;
use ora_crypto::ContentAddresser;
use ora_types::Cid;

use crate::error::{ProviderError, ProviderResult};
use crate::traits::{Capabilities, StorageBackend};

/// In-memory, HashMap-based storage backend.
///
/// Intended for tests and embedding. Content is keyed by its CIDv0, so a
/// request for the v1 form of the same block resolves to the same entry.
pub struct InMemoryBackend {
    name: String,
    blocks: RwLock<HashMap<Cid, Bytes>>,
    pinned: RwLock<HashSet<Cid>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::named("memory")
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            blocks: RwLock::new(HashMap::new()),
            pinned: RwLock::new(HashSet::new()),
        }
    }

    /// Number of stored payloads.
    pub fn len(&self) -> usize {
        self.read_blocks().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_blocks().is_empty()
    }

    pub fn contains(&self, cid: &Cid) -> bool {
        let key = cid.to_v0().unwrap_or(*cid);
        self.read_blocks().contains_key(&key)
    }

    pub fn is_pinned(&self, cid: &Cid) -> bool {
        let key = cid.to_v0().unwrap_or(*cid);
        self.pinned.read().unwrap_or_else(|e| e.into_inner()).contains(&key)
    }

    /// Store `content` under `cid` without hashing it. Lets tests stage a
    /// backend that serves corrupted data.
    pub fn insert_raw(&self, cid: Cid, content: impl Into<Bytes>) {
        let key = cid.to_v0().unwrap_or(cid);
        self.write_blocks().insert(key, content.into());
    }

    fn read_blocks(&self) -> RwLockReadGuard<'_, HashMap<Cid, Bytes>> {
        self.blocks.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_blocks(&self) -> RwLockWriteGuard<'_, HashMap<Cid, Bytes>> {
        self.blocks.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageBackend for InMemoryBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::FULL
    }

    async fn fetch(&self, cid: &Cid) -> ProviderResult<Bytes> {
        let key = cid.to_v0()?;
        self.read_blocks()
            .get(&key)
            .cloned()
            .ok_or_else(|| ProviderError::Fetch {
                cid: *cid,
                reason: "not found".into(),
            })
    }

    async fn upload(&self, content: &[u8], _name: Option<&str>) -> ProviderResult<Cid> {
        let cid = ContentAddresser.compute_cid(content)?;
        // Idempotent: the same identifier always maps to the same content.
        self.write_blocks()
            .entry(cid)
            .or_insert_with(|| Bytes::copy_from_slice(content));
        Ok(cid)
    }

    async fn pin(&self, cid: &Cid) -> ProviderResult<()> {
        let key = cid.to_v0()?;
        if !self.read_blocks().contains_key(&key) {
            return Err(ProviderError::Pin {
                cid: *cid,
                reason: "not found".into(),
            });
        }
        self.pinned
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key);
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBackend")
            .field("name", &self.name)
            .field("block_count", &self.len())
            .finish()
    }
}
