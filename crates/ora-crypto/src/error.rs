use ora_types::TypeError;

/// Errors from content addressing.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum AddressingError {
    /// The payload needs more leaves than a single root node can link.
    #[error("content too large for a single-level DAG: {size} bytes (max {max})")]
    ContentTooLarge { size: usize, max: usize },

    /// A CAR archive must name at least one root.
    #[error("CAR archive needs at least one root")]
    NoRoots,

    /// The CAR header could not be serialized.
    #[error("failed to encode CAR header: {0}")]
    CarHeader(String),

    /// The identifier to compare against cannot be normalized to CIDv0.
    #[error(transparent)]
    Identifier(#[from] TypeError),
}

/// Result alias for addressing operations.
pub type AddressingResult<T> = Result<T, AddressingError>;
