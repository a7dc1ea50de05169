use std::num::NonZeroUsize;

use bytes::Bytes;
use futures::future::join_all;
use ora_store::{Operation, Provider};
use ora_types::{Cid, FrameNumber};
use rand::seq::SliceRandom;
use rand::Rng;
use tokio::sync::Mutex;

use crate::error::{SyncError, SyncResult};
use crate::quorum::ConsensusResult;
use crate::rotation::RotationCursor;

/// Payload written and read back by [`MultiProvider::self_check`].
pub const SELF_CHECK_PAYLOAD: &[u8] = b"ora storage self-check";

/// Several storage providers presented as one.
///
/// Reads go to one provider at a time, chosen by frame rotation, with
/// per-provider retries and fallback to the next provider. Writes fan out to
/// every provider at once and resolve to the identifier a quorum agrees on.
///
/// Provider order is fixed at construction. Concurrent reads are serialized
/// on the rotation cursor; writes never touch it.
#[derive(Debug)]
pub struct MultiProvider {
    providers: Vec<Provider>,
    retries: u32,
    cursor: Mutex<RotationCursor>,
}

impl MultiProvider {
    /// Shuffle `providers` with the thread RNG.
    pub fn new(providers: Vec<Provider>, retries: u32) -> SyncResult<Self> {
        Self::with_rng(providers, retries, &mut rand::thread_rng())
    }

    /// Shuffle `providers` with `rng`.
    pub fn with_rng<R: Rng + ?Sized>(
        mut providers: Vec<Provider>,
        retries: u32,
        rng: &mut R,
    ) -> SyncResult<Self> {
        providers.shuffle(rng);
        Self::from_ordered(providers, retries)
    }

    /// Keep `providers` in the given order.
    pub fn from_ordered(providers: Vec<Provider>, retries: u32) -> SyncResult<Self> {
        let len = NonZeroUsize::new(providers.len())
            .ok_or_else(|| SyncError::InvalidConfig("no storage providers configured".into()))?;
        if retries == 0 {
            return Err(SyncError::InvalidConfig("retries must be at least 1".into()));
        }
        let order: Vec<&str> = providers.iter().map(|p| p.name()).collect();
        tracing::info!(?order, retries, "storage providers attached");

        Ok(Self {
            cursor: Mutex::new(RotationCursor::new(len)),
            providers,
            retries,
        })
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn providers(&self) -> &[Provider] {
        &self.providers
    }

    /// Fetch `cid`, starting from the provider `frame` rotates to.
    pub async fn fetch(&self, cid: &Cid, frame: FrameNumber) -> SyncResult<Bytes> {
        let mut cursor = self.cursor.lock().await;
        if cursor.enter_frame(frame) {
            tracing::debug!(frame = %frame, index = cursor.current(), "rotated read provider");
        }

        let mut attempted = 0;
        loop {
            let index = cursor.current();
            attempted += 1;
            tracing::info!(
                frame = %frame,
                index,
                provider = %self.providers[index].name(),
                cid = %cid,
                "storage fetch"
            );

            match self.fetch_with_retries(index, cid).await {
                Ok(content) => {
                    cursor.commit();
                    return Ok(content);
                }
                Err(err) => {
                    if cursor.advance().is_none() {
                        tracing::error!(cid = %cid, attempted, error = %err, "no more storage providers left to call");
                        return Err(SyncError::NoProvidersAvailable {
                            operation: Operation::Fetch,
                            attempted,
                            last: Box::new(err),
                        });
                    }
                    tracing::warn!(index, next = cursor.current(), error = %err, "falling back to next provider");
                }
            }
        }
    }

    async fn fetch_with_retries(&self, index: usize, cid: &Cid) -> SyncResult<Bytes> {
        let provider = &self.providers[index];
        let mut attempt = 0;
        loop {
            attempt += 1;
            let err = match provider.fetch(cid).await {
                Ok(content) => return Ok(content),
                Err(err) => err,
            };

            if !err.is_retryable() {
                return Err(SyncError::ProviderFailed {
                    index,
                    provider: provider.name().to_string(),
                    source: err,
                });
            }
            if attempt >= self.retries {
                return Err(SyncError::RetriesExhausted {
                    index,
                    provider: provider.name().to_string(),
                    attempts: attempt,
                    source: err,
                });
            }
            tracing::warn!(
                index,
                provider = %provider.name(),
                attempt,
                retries_left = self.retries - attempt,
                error = %err,
                "retrying storage fetch"
            );
        }
    }

    /// Publish to every provider and return the agreed identifier.
    pub async fn publish(&self, content: &[u8], name: Option<&str>) -> SyncResult<Cid> {
        Ok(self.publish_with_consensus(content, name).await?.cid)
    }

    /// Publish to every provider concurrently and report each outcome.
    pub async fn publish_with_consensus(
        &self,
        content: &[u8],
        name: Option<&str>,
    ) -> SyncResult<ConsensusResult> {
        let outcomes = join_all(self.providers.iter().enumerate().map(|(index, provider)| async move {
            let outcome = provider.publish(content, name).await;
            (index, provider.name().to_string(), outcome)
        }))
        .await;

        for (index, provider, outcome) in &outcomes {
            match outcome {
                Ok(cid) => tracing::info!(index, provider = %provider, cid = %cid, "provider published"),
                Err(e) => tracing::warn!(index, provider = %provider, error = %e, "provider failed to publish"),
            }
        }

        let result = ConsensusResult::decide(self.providers.len(), outcomes);
        match &result {
            Ok(r) => tracing::info!(
                cid = %r.cid,
                votes = r.votes(&r.cid),
                quorum = r.quorum,
                reached_quorum = r.reached_quorum,
                succeeded = r.successes.len(),
                failed = r.failures.len(),
                "publish decided"
            ),
            Err(e) => tracing::error!(error = %e, "publish failed on every provider"),
        }
        result
    }

    /// Publish a fixed payload and read it back through the read path.
    pub async fn self_check(&self, frame: FrameNumber) -> SyncResult<Cid> {
        let cid = self.publish(SELF_CHECK_PAYLOAD, None).await?;
        let fetched = self.fetch(&cid, frame).await?;
        if fetched.as_ref() != SELF_CHECK_PAYLOAD {
            return Err(SyncError::SelfCheckMismatch { cid });
        }
        Ok(cid)
    }
}
