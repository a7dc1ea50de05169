use ora_types::Cid;
use prost::Message;
use sha2::{Digest, Sha256};

use crate::dag::{PbLink, PbNode};
use crate::error::{AddressingError, AddressingResult};
use crate::unixfs::UnixFsData;

/// Fixed-size chunker width (`size-262144`).
pub const CHUNK_SIZE: usize = 262_144;

/// Maximum links in one balanced-layout node.
pub const MAX_LINKS: usize = 174;

/// One serialized DAG-PB block and its CIDv0.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub cid: Cid,
    pub data: Vec<u8>,
}

impl Block {
    fn new(data: Vec<u8>) -> Self {
        Self {
            cid: Cid::v0(sha256(&data)),
            data,
        }
    }
}

/// All blocks of a file DAG; `root` is the CID of the last block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileDag {
    pub root: Cid,
    pub blocks: Vec<Block>,
}

/// Computes the identifier storage networks assign to a byte payload.
///
/// Reproduces the UnixFS importer configured with `chunker=size-262144`,
/// `hash=sha2-256`, `cid-version=0`, `raw-leaves=false`:
///
/// - payloads up to [`CHUNK_SIZE`] become one DAG-PB leaf whose `Data` is a
///   UnixFS file node carrying the bytes;
/// - larger payloads are cut into [`CHUNK_SIZE`] leaves under a single root
///   listing each leaf's multihash, serialized size and chunk length.
///
/// Only one level of links is produced, so payloads needing more than
/// [`MAX_LINKS`] leaves are refused with [`AddressingError::ContentTooLarge`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ContentAddresser;

impl ContentAddresser {
    /// Largest payload that fits a single root node.
    pub const MAX_CONTENT_LEN: usize = CHUNK_SIZE * MAX_LINKS;

    /// Compute the CIDv0 of `content`.
    pub fn compute_cid(&self, content: &[u8]) -> AddressingResult<Cid> {
        if content.len() <= CHUNK_SIZE {
            return Ok(Cid::v0(sha256(&leaf_block(content))));
        }
        Ok(self.build_dag(content)?.root)
    }

    /// Build every block of the DAG for `content`: the leaves in payload
    /// order, then the root when there is more than one leaf.
    pub fn build_dag(&self, content: &[u8]) -> AddressingResult<FileDag> {
        if content.len() <= CHUNK_SIZE {
            let leaf = Block::new(leaf_block(content));
            return Ok(FileDag {
                root: leaf.cid,
                blocks: vec![leaf],
            });
        }

        if content.len() > Self::MAX_CONTENT_LEN {
            return Err(AddressingError::ContentTooLarge {
                size: content.len(),
                max: Self::MAX_CONTENT_LEN,
            });
        }

        let leaves = content.len().div_ceil(CHUNK_SIZE);
        let mut blocks = Vec::with_capacity(leaves + 1);
        let mut links = Vec::with_capacity(leaves);
        let mut blocksizes = Vec::with_capacity(leaves);
        for chunk in content.chunks(CHUNK_SIZE) {
            let leaf = Block::new(leaf_block(chunk));
            links.push(PbLink::unnamed(leaf.cid.multihash_bytes(), leaf.data.len() as u64));
            blocksizes.push(chunk.len() as u64);
            blocks.push(leaf);
        }

        let root = Block::new(
            PbNode {
                links,
                data: Some(UnixFsData::file_root(blocksizes).encode_to_vec()),
            }
            .encode(),
        );
        let cid = root.cid;
        blocks.push(root);
        Ok(FileDag { root: cid, blocks })
    }

    /// Check that `content` hashes to `expected`.
    ///
    /// A CIDv1 is normalized to v0 before comparison; identifiers with no v0
    /// form fail with [`AddressingError::Identifier`].
    pub fn verify(&self, content: &[u8], expected: &Cid) -> AddressingResult<bool> {
        let expected = expected.to_v0()?;
        Ok(self.compute_cid(content)? == expected)
    }
}

/// Compute the CIDv0 of `content` with the default importer settings.
pub fn compute_cid(content: &[u8]) -> AddressingResult<Cid> {
    ContentAddresser.compute_cid(content)
}

/// Serialized DAG-PB leaf for one chunk.
pub fn leaf_block(chunk: &[u8]) -> Vec<u8> {
    PbNode::leaf(UnixFsData::file_leaf(chunk).encode_to_vec()).encode()
}

fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}
