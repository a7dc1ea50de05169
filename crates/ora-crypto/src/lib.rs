//! Content addressing for ORA.
//!
//! Computes the CIDv0 that third-party storage networks assign to a byte
//! payload, bit-for-bit: UnixFS file nodes inside DAG-PB blocks, fixed
//! 256 KiB chunks, sha2-256 digests. Independent oracle operators derive the
//! same identifier for the same bytes without talking to each other.
//!
//! [`create_car`] packs the same DAG into a CARv1 archive for storage
//! networks that ingest archives rather than raw bytes.
//!
//! All hashing wraps established libraries; no custom cryptography.

pub mod car;
pub mod dag;
pub mod error;
pub mod hasher;
pub mod unixfs;

pub use car::{create_car, encode_car, CarFile, CAR_VERSION};
pub use dag::{PbLink, PbNode};
pub use error::{AddressingError, AddressingResult};
pub use hasher::{compute_cid, leaf_block, Block, ContentAddresser, FileDag, CHUNK_SIZE, MAX_LINKS};
pub use unixfs::{DataType, UnixFsData};
