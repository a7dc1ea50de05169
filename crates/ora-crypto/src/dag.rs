//! DAG-PB node serialization.
//!
//! ```text
//! message PBLink { optional bytes Hash = 1; optional string Name = 2; optional uint64 Tsize = 3; }
//! message PBNode { repeated PBLink Links = 2; optional bytes Data = 1; }
//! ```
//!
//! Canonical DAG-PB writes every `Links` entry before `Data`. prost's derive
//! emits fields in tag order, so [`PbNode`] is encoded by hand from prost's
//! field encoders.

use prost::encoding::{bytes, message};
use prost::Message;

/// Link from a DAG-PB node to a child block.
#[derive(Clone, PartialEq, prost::Message)]
pub struct PbLink {
    /// Child multihash (CIDv0 bytes).
    #[prost(bytes = "vec", optional, tag = "1")]
    pub hash: Option<Vec<u8>>,
    #[prost(string, optional, tag = "2")]
    pub name: Option<String>,
    /// Cumulative serialized size of the child.
    #[prost(uint64, optional, tag = "3")]
    pub tsize: Option<u64>,
}

impl PbLink {
    /// Unnamed link as produced for file chunks; the empty name is still
    /// serialized.
    pub fn unnamed(hash: Vec<u8>, tsize: u64) -> Self {
        Self {
            hash: Some(hash),
            name: Some(String::new()),
            tsize: Some(tsize),
        }
    }
}

/// A DAG-PB node: child links plus an opaque payload.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PbNode {
    pub links: Vec<PbLink>,
    pub data: Option<Vec<u8>>,
}

#[derive(Clone, PartialEq, prost::Message)]
struct PbNodeWire {
    #[prost(bytes = "vec", optional, tag = "1")]
    data: Option<Vec<u8>>,
    #[prost(message, repeated, tag = "2")]
    links: Vec<PbLink>,
}

impl PbNode {
    /// Node with a payload and no links.
    pub fn leaf(data: Vec<u8>) -> Self {
        Self {
            links: Vec::new(),
            data: Some(data),
        }
    }

    /// Canonical serialization (links first, then data).
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        for link in &self.links {
            message::encode(2, link, &mut buf);
        }
        if let Some(data) = &self.data {
            bytes::encode(1, data, &mut buf);
        }
        buf
    }

    pub fn encoded_len(&self) -> usize {
        let links: usize = self
            .links
            .iter()
            .map(|link| message::encoded_len(2, link))
            .sum();
        links + self.data.as_ref().map_or(0, |d| bytes::encoded_len(1, d))
    }

    /// Decode a node. Field order in the input is not checked.
    pub fn decode(buf: &[u8]) -> Result<Self, prost::DecodeError> {
        let wire = PbNodeWire::decode(buf)?;
        Ok(Self {
            links: wire.links,
            data: wire.data,
        })
    }
}
