//! UnixFS `Data` payload carried inside DAG-PB nodes.
//!
//! Field layout follows `unixfs.proto` (proto2):
//!
//! ```text
//! message Data {
//!     required DataType Type = 1;
//!     optional bytes Data = 2;
//!     optional uint64 filesize = 3;
//!     repeated uint64 blocksizes = 4;   // not packed
//! }
//! ```

/// UnixFS node type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum DataType {
    Raw = 0,
    Directory = 1,
    File = 2,
    Metadata = 3,
    Symlink = 4,
    HamtShard = 5,
}

/// UnixFS `Data` message.
#[derive(Clone, PartialEq, prost::Message)]
pub struct UnixFsData {
    #[prost(enumeration = "DataType", required, tag = "1")]
    pub kind: i32,
    #[prost(bytes = "vec", optional, tag = "2")]
    pub data: Option<Vec<u8>>,
    #[prost(uint64, optional, tag = "3")]
    pub filesize: Option<u64>,
    #[prost(uint64, repeated, packed = "false", tag = "4")]
    pub blocksizes: Vec<u64>,
}

impl UnixFsData {
    /// Leaf payload for one file chunk.
    ///
    /// An empty chunk omits the `Data` field entirely, matching the
    /// reference importer.
    pub fn file_leaf(chunk: &[u8]) -> Self {
        Self {
            kind: DataType::File as i32,
            data: (!chunk.is_empty()).then(|| chunk.to_vec()),
            filesize: Some(chunk.len() as u64),
            blocksizes: Vec::new(),
        }
    }

    /// Root payload for a file split into chunks of the given sizes.
    pub fn file_root(blocksizes: Vec<u64>) -> Self {
        Self {
            kind: DataType::File as i32,
            data: None,
            filesize: Some(blocksizes.iter().sum()),
            blocksizes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn leaf_bytes() {
        let encoded = UnixFsData::file_leaf(b"hi").encode_to_vec();
        assert_eq!(encoded, vec![0x08, 0x02, 0x12, 0x02, b'h', b'i', 0x18, 0x02]);
    }

    #[test]
    fn empty_leaf_omits_data() {
        let encoded = UnixFsData::file_leaf(b"").encode_to_vec();
        assert_eq!(encoded, vec![0x08, 0x02, 0x18, 0x00]);
    }

    #[test]
    fn root_blocksizes_are_unpacked() {
        let encoded = UnixFsData::file_root(vec![3, 1]).encode_to_vec();
        assert_eq!(
            encoded,
            vec![0x08, 0x02, 0x18, 0x04, 0x20, 0x03, 0x20, 0x01]
        );
    }

    #[test]
    fn decode_roundtrip() {
        let root = UnixFsData::file_root(vec![262_144, 1]);
        let decoded = UnixFsData::decode(root.encode_to_vec().as_slice()).unwrap();
        assert_eq!(decoded.kind, DataType::File as i32);
        assert_eq!(decoded.filesize, Some(262_145));
        assert_eq!(decoded.blocksizes, vec![262_144, 1]);
    }
}
