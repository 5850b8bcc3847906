//! Error types for the strata level index.

use std::io;

/// The result type used throughout strata.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for level index operations.
///
/// A missing key is never an error: lookups report absence as `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An I/O error occurred in a table-access collaborator.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Stored data could not be decoded (malformed internal key, unknown record kind).
    #[error("Data corruption: {0}")]
    Corruption(String),

    /// A table file or handle could not be located.
    #[error("Not found: {0}")]
    NotFound(String),

    /// An invalid argument was provided.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A structural invariant of a level or version does not hold.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Creates a new corruption error.
    pub fn corruption(msg: impl Into<String>) -> Self {
        Error::Corruption(msg.into())
    }

    /// Creates a new not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    /// Creates a new invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// Creates a new invalid state error.
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Error::InvalidState(msg.into())
    }

    /// Creates a new internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }

    /// Returns true if this error reports damaged stored data.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Error::Corruption(_))
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
