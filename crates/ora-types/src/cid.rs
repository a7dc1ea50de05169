use std::fmt;
use std::str::FromStr;

use data_encoding::BASE32_NOPAD;
use prost::encoding::{decode_varint, encode_varint};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{TypeError, TypeResult};

/// Multicodec codes understood by [`Cid`].
pub mod codec {
    /// MerkleDAG protobuf node.
    pub const DAG_PB: u64 = 0x70;
    /// Raw bytes, no framing.
    pub const RAW: u64 = 0x55;
    /// A CARv1 archive, used to name upload shards.
    pub const CAR: u64 = 0x0202;
}

/// Multihash function codes understood by [`Cid`].
pub mod multihash {
    pub const SHA2_256: u64 = 0x12;
    pub const SHA2_256_LEN: usize = 32;
}

/// Length of a CIDv0 string: base58btc of a 34-byte sha2-256 multihash.
const V0_STRING_LEN: usize = 46;

/// Returns `true` if `s` has the shape of a CIDv0 string (`Qm…`, 46 chars).
///
/// This is a cheap syntactic test; use [`Cid::parse`] to actually decode.
pub fn is_cid_v0(s: &str) -> bool {
    s.starts_with("Qm") && s.len() == V0_STRING_LEN
}

/// CID version.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CidVersion {
    V0,
    V1,
}

/// Self-describing content identifier.
///
/// A `Cid` is the triple (codec, multihash function, digest) plus a version
/// that decides the canonical string encoding: CIDv0 renders as base58btc of
/// the bare multihash (`Qm…`), CIDv1 as base32-lower multibase (`b…`).
///
/// Only sha2-256 digests are representable. Two `Cid`s are equal iff their
/// canonical encodings are equal, so a CIDv0 and the CIDv1 naming the same
/// DAG-PB block are *different* values; use [`Cid::to_v0`] to normalize.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cid {
    version: CidVersion,
    codec: u64,
    digest: [u8; multihash::SHA2_256_LEN],
}

impl Cid {
    /// CIDv0 for a DAG-PB block with the given sha2-256 digest.
    pub const fn v0(digest: [u8; 32]) -> Self {
        Self {
            version: CidVersion::V0,
            codec: codec::DAG_PB,
            digest,
        }
    }

    /// CIDv1 with an explicit codec.
    pub fn v1(codec: u64, digest: [u8; 32]) -> TypeResult<Self> {
        check_codec(codec)?;
        Ok(Self {
            version: CidVersion::V1,
            codec,
            digest,
        })
    }

    /// Parse a CID from its string form.
    ///
    /// Accepts CIDv0 (`Qm…`) and CIDv1 in base32 (`b…`/`B…`) or base58btc
    /// (`z…`) multibase.
    pub fn parse(s: &str) -> TypeResult<Self> {
        if s.is_empty() {
            return Err(TypeError::MalformedIdentifier("empty string".into()));
        }

        if s.starts_with("Qm") {
            if s.len() != V0_STRING_LEN {
                return Err(TypeError::MalformedIdentifier(format!(
                    "CIDv0 must be {V0_STRING_LEN} characters, got {}",
                    s.len()
                )));
            }
            let bytes = bs58::decode(s)
                .into_vec()
                .map_err(|e| TypeError::MalformedIdentifier(e.to_string()))?;
            return Self::from_bytes(&bytes);
        }

        let bytes = match s.as_bytes()[0] {
            b'b' => BASE32_NOPAD
                .decode(s[1..].to_ascii_uppercase().as_bytes())
                .map_err(|e| TypeError::MalformedIdentifier(e.to_string()))?,
            b'B' => BASE32_NOPAD
                .decode(s[1..].as_bytes())
                .map_err(|e| TypeError::MalformedIdentifier(e.to_string()))?,
            b'z' => bs58::decode(&s[1..])
                .into_vec()
                .map_err(|e| TypeError::MalformedIdentifier(e.to_string()))?,
            _ => {
                let prefix = s.chars().next().unwrap_or_default();
                return Err(TypeError::UnsupportedEncoding(format!(
                    "multibase prefix '{prefix}'"
                )));
            }
        };

        let cid = Self::from_bytes(&bytes)?;
        if cid.version == CidVersion::V0 {
            // A bare multihash is only legal in the unprefixed v0 form.
            return Err(TypeError::MalformedIdentifier(
                "multibase-prefixed CIDv0".into(),
            ));
        }
        Ok(cid)
    }

    /// Decode the binary form of a CID.
    ///
    /// A 34-byte sha2-256 multihash is read as CIDv0; anything else must be a
    /// varint-prefixed CIDv1.
    pub fn from_bytes(bytes: &[u8]) -> TypeResult<Self> {
        if bytes.len() == 2 + multihash::SHA2_256_LEN
            && bytes[0] == multihash::SHA2_256 as u8
            && bytes[1] == multihash::SHA2_256_LEN as u8
        {
            return Ok(Self::v0(read_digest(&bytes[2..])?));
        }

        let mut buf = bytes;
        let version = decode_varint(&mut buf)
            .map_err(|e| TypeError::MalformedIdentifier(e.to_string()))?;
        match version {
            1 => {}
            v if v == multihash::SHA2_256 => {
                return Err(TypeError::MalformedIdentifier(format!(
                    "truncated or oversized multihash ({} bytes)",
                    bytes.len()
                )));
            }
            v => {
                return Err(TypeError::UnsupportedEncoding(format!("CID version {v}")));
            }
        }

        let codec = decode_varint(&mut buf)
            .map_err(|e| TypeError::MalformedIdentifier(e.to_string()))?;
        check_codec(codec)?;

        let digest = decode_multihash(buf)?;
        Ok(Self {
            version: CidVersion::V1,
            codec,
            digest,
        })
    }

    /// Binary form: the bare multihash for v0, `<version><codec><multihash>`
    /// for v1.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self.version {
            CidVersion::V0 => self.multihash_bytes(),
            CidVersion::V1 => {
                let mut out = Vec::with_capacity(4 + 2 + multihash::SHA2_256_LEN);
                encode_varint(1, &mut out);
                encode_varint(self.codec, &mut out);
                out.extend_from_slice(&self.multihash_bytes());
                out
            }
        }
    }

    /// `<hash code><digest length><digest>`.
    pub fn multihash_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(2 + multihash::SHA2_256_LEN);
        encode_varint(multihash::SHA2_256, &mut out);
        encode_varint(multihash::SHA2_256_LEN as u64, &mut out);
        out.extend_from_slice(&self.digest);
        out
    }

    /// Convert to CIDv0. Only DAG-PB identifiers have a v0 form.
    pub fn to_v0(&self) -> TypeResult<Self> {
        match (self.version, self.codec) {
            (CidVersion::V0, _) => Ok(*self),
            (CidVersion::V1, codec::DAG_PB) => Ok(Self::v0(self.digest)),
            (CidVersion::V1, other) => Err(TypeError::UnsupportedEncoding(format!(
                "codec 0x{other:x} has no CIDv0 form"
            ))),
        }
    }

    /// Convert to CIDv1, keeping the codec.
    pub fn to_v1(&self) -> Self {
        Self {
            version: CidVersion::V1,
            codec: self.codec,
            digest: self.digest,
        }
    }

    pub fn version(&self) -> CidVersion {
        self.version
    }

    pub fn codec(&self) -> u64 {
        self.codec
    }

    pub fn hash_code(&self) -> u64 {
        multihash::SHA2_256
    }

    /// The raw sha2-256 digest.
    pub fn digest(&self) -> &[u8; 32] {
        &self.digest
    }
}

fn check_codec(codec: u64) -> TypeResult<()> {
    match codec {
        codec::DAG_PB | codec::RAW | codec::CAR => Ok(()),
        other => Err(TypeError::UnsupportedEncoding(format!("multicodec 0x{other:x}"))),
    }
}

fn decode_multihash(mut buf: &[u8]) -> TypeResult<[u8; 32]> {
    let code =
        decode_varint(&mut buf).map_err(|e| TypeError::MalformedIdentifier(e.to_string()))?;
    if code != multihash::SHA2_256 {
        return Err(TypeError::UnsupportedEncoding(format!(
            "multihash function 0x{code:x}"
        )));
    }
    let len =
        decode_varint(&mut buf).map_err(|e| TypeError::MalformedIdentifier(e.to_string()))?;
    if len != multihash::SHA2_256_LEN as u64 {
        return Err(TypeError::MalformedIdentifier(format!(
            "sha2-256 digest length {len}"
        )));
    }
    read_digest(buf)
}

fn read_digest(buf: &[u8]) -> TypeResult<[u8; 32]> {
    buf.try_into().map_err(|_| {
        TypeError::MalformedIdentifier(format!(
            "expected {} digest bytes, got {}",
            multihash::SHA2_256_LEN,
            buf.len()
        ))
    })
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.version {
            CidVersion::V0 => write!(f, "{}", bs58::encode(self.multihash_bytes()).into_string()),
            CidVersion::V1 => write!(
                f,
                "b{}",
                BASE32_NOPAD.encode(&self.to_bytes()).to_ascii_lowercase()
            ),
        }
    }
}

impl fmt::Debug for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cid({self})")
    }
}

impl FromStr for Cid {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Cid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Cid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
