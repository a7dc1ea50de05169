use std::fmt;

use ora_crypto::AddressingError;
use ora_types::{Cid, TypeError};

/// A provider operation, used in capability checks and error reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Fetch,
    Upload,
    Pin,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch => write!(f, "fetch"),
            Self::Upload => write!(f, "upload"),
            Self::Pin => write!(f, "pin"),
        }
    }
}

/// Errors from a single storage provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// No content could be retrieved for the identifier.
    #[error("unable to fetch {cid}: {reason}")]
    Fetch { cid: Cid, reason: String },

    #[error("unable to upload: {0}")]
    Upload(String),

    #[error("unable to pin {cid}: {reason}")]
    Pin { cid: Cid, reason: String },

    /// The backend lacks the capability. Never transient.
    #[error("{provider} does not support {operation}")]
    Unsupported {
        provider: String,
        operation: Operation,
    },

    /// Bytes and identifier disagree: on fetch the served bytes do not hash
    /// to the requested CID, on upload the vendor reported a CID that the
    /// uploaded bytes do not hash to.
    #[error("content validation failed: expected {expected}, got {actual}")]
    ContentValidation { expected: Cid, actual: Cid },

    /// Network, timeout or HTTP-level failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The vendor returned an identifier that could not be decoded.
    #[error("invalid identifier: {0}")]
    Identifier(#[from] TypeError),

    #[error(transparent)]
    Addressing(#[from] AddressingError),
}

impl ProviderError {
    /// Whether repeating the same call could succeed.
    ///
    /// Capability gaps, undecodable or unverifiable identifiers, and
    /// oversized content fail the same way every time.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::Unsupported { .. }
                | Self::Identifier(_)
                | Self::Addressing(AddressingError::ContentTooLarge { .. })
        )
    }

    /// Whether this is a self-verification failure.
    pub fn is_content_mismatch(&self) -> bool {
        matches!(self, Self::ContentValidation { .. })
    }
}

/// Result alias for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;
