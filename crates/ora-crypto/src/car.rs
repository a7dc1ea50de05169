use ciborium::value::Value;
use ora_types::{codec, Cid};
use prost::encoding::encode_varint;
use sha2::{Digest, Sha256};

use crate::error::{AddressingError, AddressingResult};
use crate::hasher::{Block, ContentAddresser};

/// Version written into every archive header.
pub const CAR_VERSION: u64 = 1;

/// DAG-CBOR tag for an embedded CID.
const CID_TAG: u64 = 42;

/// A payload packed as a single CARv1 archive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CarFile {
    pub bytes: Vec<u8>,
    /// CIDv0 of the payload, identical to [`crate::compute_cid`].
    pub root: Cid,
    /// CIDv1 naming the archive itself (codec `car`, sha2-256 of `bytes`).
    pub shard: Cid,
}

impl CarFile {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Pack `content` into a CARv1 archive rooted at its UnixFS file node.
///
/// Blocks are written leaves first, root last.
pub fn create_car(content: &[u8]) -> AddressingResult<CarFile> {
    let dag = ContentAddresser.build_dag(content)?;
    let bytes = encode_car(&[dag.root], &dag.blocks)?;
    let shard = Cid::v1(codec::CAR, Sha256::digest(&bytes).into())?;
    Ok(CarFile {
        bytes,
        root: dag.root,
        shard,
    })
}

/// Serialize a CARv1 archive: a varint-framed DAG-CBOR header followed by
/// one varint-framed `cid || data` section per block.
pub fn encode_car(roots: &[Cid], blocks: &[Block]) -> AddressingResult<Vec<u8>> {
    if roots.is_empty() {
        return Err(AddressingError::NoRoots);
    }

    let header = encode_header(roots)?;
    let mut out = Vec::with_capacity(
        header.len() + blocks.iter().map(|b| b.data.len() + 48).sum::<usize>(),
    );
    encode_varint(header.len() as u64, &mut out);
    out.extend_from_slice(&header);

    for block in blocks {
        let cid = block.cid.to_bytes();
        encode_varint((cid.len() + block.data.len()) as u64, &mut out);
        out.extend_from_slice(&cid);
        out.extend_from_slice(&block.data);
    }
    Ok(out)
}

// Keys in DAG-CBOR canonical order: shorter first.
fn encode_header(roots: &[Cid]) -> AddressingResult<Vec<u8>> {
    let roots = roots
        .iter()
        .map(|cid| {
            let mut link = Vec::with_capacity(37);
            link.push(0x00);
            link.extend_from_slice(&cid.to_bytes());
            Value::Tag(CID_TAG, Box::new(Value::Bytes(link)))
        })
        .collect();
    let header = Value::Map(vec![
        (Value::Text("roots".into()), Value::Array(roots)),
        (Value::Text("version".into()), Value::Integer(CAR_VERSION.into())),
    ]);

    let mut buf = Vec::new();
    ciborium::into_writer(&header, &mut buf)
        .map_err(|e| AddressingError::CarHeader(e.to_string()))?;
    Ok(buf)
}
