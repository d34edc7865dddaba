//! Error and result types for store operations.

use bson::error::Error as BsonError;
use thiserror::Error;

/// Errors surfaced by document store backends.
///
/// [`StoreError::DuplicateKey`] is the one variant with operation-level
/// meaning: it is how a backend reports a unique-index violation. Callers
/// must treat it as authoritative and never pre-check for collisions, since
/// only the store can decide uniqueness atomically.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to convert a record to or from its stored representation.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// Store construction or connection setup failed.
    #[error("initialization error: {0}")]
    Initialization(String),
    /// A unique index rejected a write.
    #[error("duplicate key: {0}")]
    DuplicateKey(String),
    /// A stored document did not have the expected shape.
    #[error("invalid document: {0}")]
    InvalidDocument(String),
    /// The underlying storage engine failed.
    #[error("backend error: {0}")]
    Backend(String),
}

/// A specialized `Result` for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl From<BsonError> for StoreError {
    fn from(err: BsonError) -> Self {
        StoreError::Serialization(err.to_string())
    }
}
