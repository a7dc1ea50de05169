use ora_protocol::{BeaconNode, ExecutionRpc, KeysApi, NetworkIdentity};
use ora_types::ChainId;

use crate::error::{SyncError, SyncResult};

/// Confirm every endpoint reports the same chain id.
///
/// Endpoints are queried in order, once each. The first answer is the
/// baseline; the first endpoint that fails or disagrees ends the check.
/// An empty list yields `None`.
pub async fn check_consistency<E: NetworkIdentity>(endpoints: &[E]) -> SyncResult<Option<ChainId>> {
    let mut baseline: Option<ChainId> = None;

    for (index, endpoint) in endpoints.iter().enumerate() {
        let got = endpoint
            .chain_id()
            .await
            .map_err(|source| SyncError::UnreachableProvider {
                index,
                endpoint: endpoint.endpoint().to_string(),
                source,
            })?;

        match baseline {
            None => baseline = Some(got),
            Some(expected) if expected != got => {
                return Err(SyncError::InconsistentProviders {
                    index,
                    expected,
                    got,
                });
            }
            Some(_) => {}
        }
        tracing::debug!(index, endpoint = %endpoint.endpoint(), chain_id = %got, "endpoint identity");
    }

    Ok(baseline)
}

/// Cross-check the identities of several layers.
///
/// Every layer must report the same value. A layer with no endpoints
/// (`None`) only agrees with other empty layers, so one unconfigured layer
/// next to configured ones fails the check.
pub fn ensure_same_network(layers: &[(&str, Option<ChainId>)]) -> SyncResult<Option<ChainId>> {
    let Some(((_, first), rest)) = layers.split_first() else {
        return Ok(None);
    };
    if rest.iter().all(|(_, id)| id == first) {
        return Ok(*first);
    }
    Err(SyncError::IncompatibleNetworks {
        layers: layers
            .iter()
            .map(|(name, id)| (name.to_string(), *id))
            .collect(),
    })
}

/// Identity clients for the three backend layers an oracle talks to.
#[derive(Debug, Default)]
pub struct NetworkEndpoints {
    pub execution: Vec<ExecutionRpc>,
    pub consensus: Vec<BeaconNode>,
    pub keys_api: Vec<KeysApi>,
}

impl NetworkEndpoints {
    /// Check each layer for internal consistency, then check the layers
    /// agree with each other.
    pub async fn check_chain_ids(&self) -> SyncResult<Option<ChainId>> {
        let keys_api = check_consistency(&self.keys_api).await?;
        let consensus = check_consistency(&self.consensus).await?;
        let execution = check_consistency(&self.execution).await?;

        let chain_id = ensure_same_network(&[
            ("execution", execution),
            ("consensus", consensus),
            ("keys-api", keys_api),
        ])?;
        if let Some(id) = chain_id {
            tracing::info!(chain_id = %id, "backend endpoints agree on network");
        }
        Ok(chain_id)
    }
}
