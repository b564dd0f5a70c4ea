use thiserror::Error;

/// Enum with all errors in this crate.
#[derive(Error, Debug)]
pub enum KdIndexError {
    /// The builder was finished without any points added.
    #[error("Cannot build an index over an empty point set.")]
    EmptyInput,

    /// A query vector's length did not match the dimension the tree was
    /// built with. Fails the offending query only; the tree is unaffected.
    #[error("Query vector has dimension {got} when the index has dimension {expected}.")]
    DimensionMismatch {
        /// Dimension the tree was built with.
        expected: usize,
        /// Length of the offending query vector.
        got: usize,
    },

    /// A query parameter was out of range (e.g. `k == 0`, negative radius).
    #[error("Invalid query parameter: {0}")]
    InvalidParameter(String),
}

/// Alias for `Result` with this crate's error type.
pub type Result<T> = std::result::Result<T, KdIndexError>;
