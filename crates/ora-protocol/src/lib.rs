//! Vendor HTTP adapters for ORA.
//!
//! Each storage vendor gets one struct implementing
//! [`ora_store::StorageBackend`]; they share an [`HttpTransport`] that retries
//! transient HTTP failures with exponential backoff. Network identity clients
//! for execution, consensus and keys-API endpoints implement
//! [`NetworkIdentity`].
//!
//! # Adapters
//!
//! - [`Kubo`] -- self-hosted node, full capability
//! - [`Pinata`] -- pins on upload, no separate pin
//! - [`PublicGateway`] -- fetch only
//! - [`Gw3`] -- HMAC-signed API
//! - [`PinningNode`] -- operator cluster, serves its own uploads only
//! - [`Storacha`] -- uploads CAR archives through the HTTP bridge

pub mod auth;
pub mod endpoint;
pub mod error;
pub mod gateway;
pub mod gw3;
pub mod http;
pub mod identity;
pub mod kubo;
pub mod pinata;
pub mod pinning_node;
pub mod storacha;

#[cfg(test)]
mod testing;

pub use auth::{Credentials, RequestSigner};
pub use endpoint::{build_backend, hosts, paths, EndpointDescriptor, UNIXFS_ADD_ARGS};
pub use error::{ProtocolError, ProtocolResult};
pub use gateway::PublicGateway;
pub use gw3::Gw3;
pub use http::{HttpOptions, HttpTransport, RETRY_STATUSES};
pub use identity::{BeaconNode, ExecutionRpc, KeysApi, NetworkIdentity};
pub use kubo::Kubo;
pub use pinata::Pinata;
pub use pinning_node::PinningNode;
pub use storacha::Storacha;
