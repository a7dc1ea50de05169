use std::fmt;

use ora_protocol::ProtocolError;
use ora_store::{Operation, ProviderError};
use ora_types::{ChainId, Cid};
use thiserror::Error;

/// One provider's failed contribution to a fan-out call.
#[derive(Debug, Error)]
#[error("[{index}] {provider}: {error}")]
pub struct ProviderFailure {
    pub index: usize,
    pub provider: String,
    #[source]
    pub error: ProviderError,
}

#[derive(Debug, Error)]
pub enum SyncError {
    /// Every attempt against one provider failed.
    #[error("provider [{index}] {provider} failed {attempts} attempts")]
    RetriesExhausted {
        index: usize,
        provider: String,
        attempts: u32,
        #[source]
        source: ProviderError,
    },

    /// A provider failed in a way retrying cannot fix.
    #[error("provider [{index}] {provider} failed")]
    ProviderFailed {
        index: usize,
        provider: String,
        #[source]
        source: ProviderError,
    },

    /// The whole provider set failed; `last` is the final provider's error.
    #[error("no providers available for {operation} after trying {attempted}")]
    NoProvidersAvailable {
        operation: Operation,
        attempted: usize,
        #[source]
        last: Box<SyncError>,
    },

    #[error("every provider rejected the upload: {}", list(.failures))]
    PublishFailed { failures: Vec<ProviderFailure> },

    #[error("endpoint [{index}] {endpoint} is not responding")]
    UnreachableProvider {
        index: usize,
        endpoint: String,
        #[source]
        source: ProtocolError,
    },

    #[error("different chain ids detected for endpoint [{index}]: expected {expected}, got {got}")]
    InconsistentProviders {
        index: usize,
        expected: ChainId,
        got: ChainId,
    },

    #[error("different chain ids detected: {}", render_layers(.layers))]
    IncompatibleNetworks {
        layers: Vec<(String, Option<ChainId>)>,
    },

    #[error("self-check fetched different bytes for {cid}")]
    SelfCheckMismatch { cid: Cid },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("config parse error: {0}")]
    Config(#[from] toml::de::Error),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

pub type SyncResult<T> = Result<T, SyncError>;

fn list(failures: &[ProviderFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn render_layers(layers: &[(String, Option<ChainId>)]) -> String {
    layers
        .iter()
        .map(|(name, id)| format!("{name}={}", Unset(*id)))
        .collect::<Vec<_>>()
        .join(", ")
}

struct Unset(Option<ChainId>);

impl fmt::Display for Unset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(id) => write!(f, "{id}"),
            None => f.write_str("none"),
        }
    }
}
