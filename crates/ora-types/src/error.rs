use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypeError {
    /// The identifier could not be decoded at all (bad base, truncated bytes,
    /// wrong digest length).
    #[error("malformed identifier: {0}")]
    MalformedIdentifier(String),

    /// The identifier decoded, but uses a multibase, multicodec or multihash
    /// this crate does not speak.
    #[error("unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),
}

/// Result alias for type operations.
pub type TypeResult<T> = Result<T, TypeError>;
