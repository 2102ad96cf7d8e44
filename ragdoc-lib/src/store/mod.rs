//! Document storage and similarity search
//!
//! # Storage Model
//!
//! Each stored record consists of:
//! - Document: identity, title, content and validation metadata
//! - Vector: the embedding, if the document has been embedded
//!
//! Records are keyed by identity. Writing a record whose identity already
//! exists replaces every field; there is never more than one record per
//! identity. A record without a vector is kept but never ranked.
//!
//! # Usage
//!
//! ```ignore
//! use ragdoc_lib::store::{VectorStore, MemoryStore};
//!
//! let store = MemoryStore::new(384);
//!
//! // Insert or replace documents carrying vectors
//! let report = store.upsert(&documents)?;
//!
//! // Search by vector similarity
//! let results = store.similarity_search(&query_vector, 5)?;
//! ```

use serde::Serialize;
use thiserror::Error;

use crate::document::{Document, RankedResult};
use crate::Result;

/// Why a record was left out of an upsert
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    #[error("required field `{0}` is empty")]
    EmptyField(&'static str),

    #[error("vector has {actual} dimensions, store expects {expected}")]
    WrongDimension { expected: usize, actual: usize },

    #[error("vector contains a non-finite value")]
    NonFiniteVector,

    #[error("record is already embedded and the update carries no vector")]
    WouldDropVector,
}

/// A record skipped during upsert
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skipped {
    /// Position in the upsert input
    pub index: usize,
    pub identity: String,
    pub reason: SkipReason,
}

/// Outcome of an upsert call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpsertReport {
    /// Records whose identity was new to the store
    pub inserted: usize,
    /// Records that replaced an existing record with the same identity
    pub replaced: usize,
    /// Records left out, with the reason
    pub skipped: Vec<Skipped>,
}

impl UpsertReport {
    /// Fold another report into this one, e.g. across ingestion batches.
    pub fn merge(&mut self, other: UpsertReport) {
        self.inserted += other.inserted;
        self.replaced += other.replaced;
        self.skipped.extend(other.skipped);
    }
}

/// Trait for document storage backends
pub trait VectorStore: Send + Sync {
    /// Insert or fully replace documents, matched by identity.
    ///
    /// Invalid records are skipped individually and listed in the report;
    /// the rest of the batch is still applied. Each record is applied
    /// atomically, the batch as a whole is not.
    fn upsert(&self, documents: &[Document]) -> Result<UpsertReport>;

    /// Search for documents similar to `query`
    ///
    /// # Returns
    /// At most `top_k` results sorted by cosine similarity (highest first),
    /// ties broken by identity ascending. Records without a vector never
    /// appear.
    fn similarity_search(&self, query: &[f32], top_k: usize) -> Result<Vec<RankedResult>>;

    /// Fetch a stored document, vector included, by identity.
    fn get(&self, identity: &str) -> Option<Document>;

    /// Up to `n` stored documents in identity order, without vectors.
    fn sample(&self, n: usize) -> Vec<Document>;

    /// Get total number of stored documents
    fn len(&self) -> usize;

    /// Number of stored documents that carry a vector
    fn embedded_len(&self) -> usize;

    /// Check if store is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Vector length this store accepts
    fn dimension(&self) -> usize;

    /// Remove every record, returning how many were removed
    fn clear(&self) -> Result<usize>;
}

mod file;
mod memory;
mod similarity;

pub use file::*;
pub use memory::*;
pub use similarity::*;
