//! Error types for ragdoc

use thiserror::Error;

use crate::validate::Rejection;

/// Result type alias for ragdoc operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in ragdoc operations
#[derive(Error, Debug)]
pub enum Error {
    /// A single record failed validation, from
    /// [`RetrievalEngine::ingest_one`](crate::search::RetrievalEngine::ingest_one).
    /// Batch operations absorb these into their reports instead.
    #[error("validation error: {0}")]
    Validation(#[from] Rejection),

    /// The embedding backend could not be loaded, failed, or returned
    /// malformed output
    #[error("embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// Ingestion input could not be read or is not a JSON array
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Failed to read or write the backing store
    #[error("persistence error: {0}")]
    Persistence(String),

    /// The query text was empty or otherwise unusable
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// A vector did not have the dimension the store was configured with
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Invalid configuration or components that do not fit together
    #[error("config error: {0}")]
    Config(String),
}
