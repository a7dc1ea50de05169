//! Foundation types for ORA.
//!
//! Every other ORA crate depends on `ora-types`.
//!
//! # Key Types
//!
//! - [`Cid`]: self-describing content identifier (CIDv0/CIDv1, sha2-256)
//! - [`FrameNumber`]: oracle reporting period, drives read rotation
//! - [`ChainId`]: network identity reported by chain backends

pub mod cid;
pub mod error;
pub mod network;

pub use cid::{codec, is_cid_v0, multihash, Cid, CidVersion};
pub use error::{TypeError, TypeResult};
pub use network::{ChainId, FrameNumber};
