//! Error types for supersql

use thiserror::Error;

/// Result type alias for supersql operations
pub type SqlResult<T> = Result<T, SqlError>;

/// Errors raised while assembling or executing a statement.
///
/// Builder errors are raised synchronously by the call that breaks the
/// contract. Driver errors are passed through untranslated.
#[derive(Debug, Error)]
pub enum SqlError {
    /// A value of the wrong kind was passed to a coercion point
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A raw string predicate was supplied without its bound value
    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    /// VALUES rows of differing widths
    #[error("VALUES rows have different lengths: expected {expected}, got {got}")]
    ValuesArityMismatch { expected: usize, got: usize },

    /// The vendor could not be resolved to a placeholder strategy
    #[error("Unsupported vendor: {0}")]
    UnsupportedVendor(String),

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Driver error, surfaced unchanged
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl SqlError {
    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Check if this is an invalid argument error
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    /// Check if this is a missing parameter error
    pub fn is_missing_parameter(&self) -> bool {
        matches!(self, Self::MissingParameter(_))
    }

    /// Check if this is a VALUES arity mismatch
    pub fn is_values_arity_mismatch(&self) -> bool {
        matches!(self, Self::ValuesArityMismatch { .. })
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for SqlError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}
