use std::collections::HashMap;

use ora_store::{Operation, ProviderError};
use ora_types::Cid;

use crate::error::{ProviderFailure, SyncError, SyncResult};

/// Number of agreeing providers needed out of `total`.
pub fn quorum(total: usize) -> usize {
    total / 2 + 1
}

/// A provider that accepted an upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishSuccess {
    pub index: usize,
    pub provider: String,
    pub cid: Cid,
}

/// Outcome of one fan-out publish.
#[derive(Debug)]
pub struct ConsensusResult {
    /// Successes in provider order.
    pub successes: Vec<PublishSuccess>,
    pub failures: Vec<ProviderFailure>,
    pub tally: HashMap<Cid, usize>,
    pub quorum: usize,
    /// The identifier the publish resolved to.
    pub cid: Cid,
    /// Whether `cid` reached quorum or was picked by the tie-break.
    pub reached_quorum: bool,
}

impl ConsensusResult {
    /// Reduce per-provider outcomes to one identifier.
    ///
    /// A CID returned by at least `quorum(total)` providers wins. Otherwise
    /// the CID of the first successful provider in `outcomes` order is used.
    pub fn decide(
        total: usize,
        outcomes: Vec<(usize, String, Result<Cid, ProviderError>)>,
    ) -> SyncResult<Self> {
        let mut successes = Vec::new();
        let mut failures = Vec::new();
        for (index, provider, outcome) in outcomes {
            match outcome {
                Ok(cid) => successes.push(PublishSuccess {
                    index,
                    provider,
                    cid,
                }),
                Err(error) => failures.push(ProviderFailure {
                    index,
                    provider,
                    error,
                }),
            }
        }

        let Some(first) = successes.first().map(|s| s.cid) else {
            return Err(SyncError::NoProvidersAvailable {
                operation: Operation::Upload,
                attempted: failures.len(),
                last: Box::new(SyncError::PublishFailed { failures }),
            });
        };

        let mut tally: HashMap<Cid, usize> = HashMap::new();
        for success in &successes {
            *tally.entry(success.cid).or_default() += 1;
        }

        let quorum = quorum(total);
        let agreed = tally
            .iter()
            .find(|(_, count)| **count >= quorum)
            .map(|(cid, _)| *cid);

        Ok(Self {
            successes,
            failures,
            tally,
            quorum,
            cid: agreed.unwrap_or(first),
            reached_quorum: agreed.is_some(),
        })
    }

    pub fn votes(&self, cid: &Cid) -> usize {
        self.tally.get(cid).copied().unwrap_or(0)
    }
}
