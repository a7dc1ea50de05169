//! Multi-provider orchestration for ORA.
//!
//! [`MultiProvider`] turns an ordered set of storage providers into one
//! logical provider:
//!
//! - reads rotate by frame, retry in place, then fall back provider by
//!   provider until one serves verified content;
//! - writes fan out to every provider at once and resolve to the CID a
//!   strict majority returned, or else the first successful provider's.
//!
//! [`check_consistency`] and [`ensure_same_network`] verify at startup that
//! every configured chain endpoint serves the same network.

pub mod config;
pub mod consistency;
pub mod error;
pub mod multi;
pub mod quorum;
pub mod rotation;

#[cfg(test)]
mod testing;

pub use config::{OracleConfig, RpcConfig, StorageConfig};
pub use consistency::{check_consistency, ensure_same_network, NetworkEndpoints};
pub use error::{ProviderFailure, SyncError, SyncResult};
pub use multi::{MultiProvider, SELF_CHECK_PAYLOAD};
pub use ora_protocol::NetworkIdentity;
pub use quorum::{quorum, ConsensusResult, PublishSuccess};
pub use rotation::RotationCursor;
