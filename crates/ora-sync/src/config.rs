use std::time::Duration;

use ora_protocol::{build_backend, BeaconNode, EndpointDescriptor, ExecutionRpc, HttpOptions, KeysApi};
use ora_store::{Provider, VerificationMode};
use serde::{Deserialize, Serialize};

use crate::consistency::NetworkEndpoints;
use crate::error::SyncResult;
use crate::multi::MultiProvider;

/// Top-level oracle access configuration.
///
/// ```toml
/// [storage]
/// retries = 3
///
/// [[storage.providers]]
/// kind = "public-gateway"
///
/// [rpc]
/// execution = ["http://el:8545"]
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub storage: StorageConfig,
    pub rpc: RpcConfig,
}

impl OracleConfig {
    pub fn from_toml_str(s: &str) -> SyncResult<Self> {
        Ok(toml::from_str(s)?)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Attempts per provider before falling back.
    pub retries: u32,
    /// Hash-check every fetch and upload. Disable only in test setups.
    pub verify_content: bool,
    pub http: HttpOptions,
    pub providers: Vec<EndpointDescriptor>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            retries: 3,
            verify_content: true,
            http: HttpOptions::default(),
            providers: Vec::new(),
        }
    }
}

impl StorageConfig {
    /// Build every configured backend and attach them, shuffled.
    pub fn build(&self) -> SyncResult<MultiProvider> {
        let verification = VerificationMode::from_flag(self.verify_content);
        if !verification.is_enabled() {
            tracing::warn!("storage content verification is disabled");
        }
        let providers = self
            .providers
            .iter()
            .map(|d| Ok(Provider::from_boxed(build_backend(d, &self.http)?, verification)))
            .collect::<SyncResult<Vec<_>>>()?;
        MultiProvider::new(providers, self.retries)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    pub execution: Vec<String>,
    pub consensus: Vec<String>,
    pub keys_api: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            execution: Vec::new(),
            consensus: Vec::new(),
            keys_api: Vec::new(),
            timeout_secs: 30,
        }
    }
}

impl RpcConfig {
    pub fn build(&self) -> SyncResult<NetworkEndpoints> {
        let timeout = Duration::from_secs(self.timeout_secs);
        Ok(NetworkEndpoints {
            execution: self
                .execution
                .iter()
                .map(|url| ExecutionRpc::new(url, timeout))
                .collect::<Result<_, _>>()?,
            consensus: self
                .consensus
                .iter()
                .map(|url| BeaconNode::new(url, timeout))
                .collect::<Result<_, _>>()?,
            keys_api: self
                .keys_api
                .iter()
                .map(|url| KeysApi::new(url, timeout))
                .collect::<Result<_, _>>()?,
        })
    }
}
