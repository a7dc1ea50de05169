//! Scripted storage backends for orchestration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use ora_crypto::compute_cid;
use ora_store::{Capabilities, ProviderError, ProviderResult, StorageBackend};
use ora_types::Cid;

/// Shared counter of backend fetch calls.
#[derive(Clone, Debug, Default)]
pub(crate) struct Tape(Arc<AtomicUsize>);

impl Tape {
    pub(crate) fn fetches(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Backend with canned answers.
pub(crate) struct Scripted {
    name: String,
    content: Option<Bytes>,
    fail_first: usize,
    reports: Option<Cid>,
    caps: Capabilities,
    delay: Option<Duration>,
    tape: Tape,
}

impl Scripted {
    /// Serves `content` for any CID; uploads report the real CID.
    pub(crate) fn healthy(name: &str, content: &[u8]) -> Self {
        Self {
            name: name.to_string(),
            content: Some(Bytes::copy_from_slice(content)),
            fail_first: 0,
            reports: None,
            caps: Capabilities::FULL,
            delay: None,
            tape: Tape::default(),
        }
    }

    /// Every call fails with a transport error.
    pub(crate) fn failing(name: &str) -> Self {
        Self {
            content: None,
            ..Self::healthy(name, b"")
        }
    }

    pub(crate) fn failing_first(mut self, n: usize) -> Self {
        self.fail_first = n;
        self
    }

    /// Uploads report `cid` whatever the content.
    pub(crate) fn reporting(mut self, cid: Cid) -> Self {
        self.reports = Some(cid);
        self
    }

    pub(crate) fn write_only(mut self) -> Self {
        self.caps.fetch = false;
        self
    }

    /// Uploads take `delay` before answering.
    pub(crate) fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn recording(mut self, tape: &Tape) -> Self {
        self.tape = tape.clone();
        self
    }
}

#[async_trait]
impl StorageBackend for Scripted {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> Capabilities {
        self.caps
    }

    async fn fetch(&self, cid: &Cid) -> ProviderResult<Bytes> {
        let call = self.tape.0.fetch_add(1, Ordering::SeqCst);
        match &self.content {
            Some(content) if call >= self.fail_first => Ok(content.clone()),
            _ => Err(ProviderError::Fetch {
                cid: *cid,
                reason: "scripted failure".into(),
            }),
        }
    }

    async fn upload(&self, content: &[u8], _name: Option<&str>) -> ProviderResult<Cid> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.content.is_none() {
            return Err(ProviderError::Upload("scripted failure".into()));
        }
        match self.reports {
            Some(cid) => Ok(cid),
            None => Ok(compute_cid(content)?),
        }
    }

    async fn pin(&self, _cid: &Cid) -> ProviderResult<()> {
        Ok(())
    }
}
