use ora_store::StorageBackend;
use serde::{Deserialize, Serialize};

use crate::error::ProtocolResult;
use crate::gateway::PublicGateway;
use crate::gw3::Gw3;
use crate::http::HttpOptions;
use crate::kubo::Kubo;
use crate::pinata::Pinata;
use crate::pinning_node::PinningNode;
use crate::storacha::Storacha;

/// HTTP paths used by the vendor and identity APIs.
pub mod paths {
    pub const IPFS: &str = "/ipfs";
    pub const KUBO_ADD: &str = "/api/v0/add";
    pub const KUBO_PIN_ADD: &str = "/api/v0/pin/add";
    pub const PINATA_PIN_FILE: &str = "/pinning/pinFileToIPFS";
    pub const PINNING_NODE_ADD: &str = "/add";
    pub const STORACHA_BRIDGE: &str = "/bridge";
    pub const BEACON_DEPOSIT_CONTRACT: &str = "/eth/v1/config/deposit_contract";
    pub const KEYS_API_STATUS: &str = "/v1/status";
}

/// Public vendor hosts.
pub mod hosts {
    pub const PINATA_API: &str = "https://api.pinata.cloud";
    pub const PINATA_GATEWAY: &str = "https://gateway.pinata.cloud";
    pub const PUBLIC_GATEWAY: &str = "https://ipfs.io";
    pub const GW3: &str = "https://gw3.io";
    pub const STORACHA_BRIDGE: &str = "https://up.storacha.network";
    pub const STORACHA_GATEWAY: &str = "https://storacha.link";
}

/// Importer settings sent with every add request, matching local addressing.
pub const UNIXFS_ADD_ARGS: [(&str, &str); 5] = [
    ("chunker", "size-262144"),
    ("hash", "sha2-256"),
    ("cid-version", "0"),
    ("trickle", "false"),
    ("raw-leaves", "false"),
];

/// One configured storage vendor.
///
/// ```toml
/// [[storage.providers]]
/// kind = "kubo"
/// host = "http://10.0.0.5"
/// rpc_port = 5001
/// gateway_port = 8080
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum EndpointDescriptor {
    Kubo {
        host: String,
        #[serde(default = "default_kubo_rpc_port")]
        rpc_port: u16,
        #[serde(default = "default_kubo_gateway_port")]
        gateway_port: u16,
    },
    Pinata {
        jwt: String,
        #[serde(default)]
        api_url: Option<String>,
        #[serde(default)]
        gateway_url: Option<String>,
    },
    PublicGateway {
        #[serde(default)]
        url: Option<String>,
    },
    Gw3 {
        access_key: String,
        access_secret: String,
        #[serde(default)]
        url: Option<String>,
    },
    PinningNode {
        host: String,
        token: String,
    },
    Storacha {
        auth_secret: String,
        authorization: String,
        space_did: String,
        #[serde(default)]
        bridge_url: Option<String>,
        #[serde(default)]
        gateway_url: Option<String>,
    },
}

fn default_kubo_rpc_port() -> u16 {
    5001
}

fn default_kubo_gateway_port() -> u16 {
    8080
}

impl EndpointDescriptor {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Kubo { .. } => "kubo",
            Self::Pinata { .. } => "pinata",
            Self::PublicGateway { .. } => "public-gateway",
            Self::Gw3 { .. } => "gw3",
            Self::PinningNode { .. } => "pinning-node",
            Self::Storacha { .. } => "storacha",
        }
    }
}

/// Build the vendor backend a descriptor names.
pub fn build_backend(
    descriptor: &EndpointDescriptor,
    options: &HttpOptions,
) -> ProtocolResult<Box<dyn StorageBackend>> {
    let options = options.clone();
    let backend: Box<dyn StorageBackend> = match descriptor {
        EndpointDescriptor::Kubo {
            host,
            rpc_port,
            gateway_port,
        } => Box::new(Kubo::new(host, *rpc_port, *gateway_port, options)?),
        EndpointDescriptor::Pinata {
            jwt,
            api_url,
            gateway_url,
        } => Box::new(Pinata::with_urls(
            jwt,
            api_url.as_deref().unwrap_or(hosts::PINATA_API),
            gateway_url.as_deref().unwrap_or(hosts::PINATA_GATEWAY),
            options,
        )?),
        EndpointDescriptor::PublicGateway { url } => Box::new(PublicGateway::new(
            url.as_deref().unwrap_or(hosts::PUBLIC_GATEWAY),
            options,
        )?),
        EndpointDescriptor::Gw3 {
            access_key,
            access_secret,
            url,
        } => Box::new(Gw3::with_url(
            access_key,
            access_secret,
            url.as_deref().unwrap_or(hosts::GW3),
            options,
        )?),
        EndpointDescriptor::PinningNode { host, token } => {
            Box::new(PinningNode::new(host, token, options)?)
        }
        EndpointDescriptor::Storacha {
            auth_secret,
            authorization,
            space_did,
            bridge_url,
            gateway_url,
        } => Box::new(Storacha::with_urls(
            auth_secret,
            authorization,
            space_did,
            bridge_url.as_deref().unwrap_or(hosts::STORACHA_BRIDGE),
            gateway_url.as_deref().unwrap_or(hosts::STORACHA_GATEWAY),
            options,
        )?),
    };
    tracing::debug!(kind = descriptor.kind(), name = backend.name(), "built storage backend");
    Ok(backend)
}
