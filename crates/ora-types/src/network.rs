use std::fmt;
use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::error::{TypeError, TypeResult};

/// Numbered oracle reporting period.
///
/// Frames are supplied by the reporting-cycle driver and only used here as an
/// input to read-provider rotation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameNumber(pub u64);

impl FrameNumber {
    /// Index into a provider list of length `len` that this frame starts on.
    pub fn rotation_index(self, len: NonZeroUsize) -> usize {
        (self.0 % len.get() as u64) as usize
    }
}

impl From<u64> for FrameNumber {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for FrameNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Network identity reported by a chain backend (EIP-155 chain id).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(pub u64);

impl ChainId {
    /// Parse a JSON-RPC hex quantity such as `"0x4268"`.
    pub fn from_hex_quantity(s: &str) -> TypeResult<Self> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| TypeError::InvalidQuantity(format!("missing 0x prefix: {s:?}")))?;
        if digits.is_empty() {
            return Err(TypeError::InvalidQuantity(format!("no digits: {s:?}")));
        }
        u64::from_str_radix(digits, 16)
            .map(Self)
            .map_err(|e| TypeError::InvalidQuantity(format!("{s:?}: {e}")))
    }

    /// Parse a decimal string such as `"17000"` (beacon API style).
    pub fn from_decimal(s: &str) -> TypeResult<Self> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|e| TypeError::InvalidQuantity(format!("{s:?}: {e}")))
    }
}

impl From<u64> for ChainId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
