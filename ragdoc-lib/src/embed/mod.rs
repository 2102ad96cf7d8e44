//! Text embedding
//!
//! The model itself is a black box behind the [`Embedder`] trait. Two
//! backends ship with the crate:
//!
//! - [`FastEmbedder`]: local ONNX inference via fastembed, defaults to
//!   `sentence-transformers/all-MiniLM-L6-v2` (384 dimensions)
//! - [`HashingEmbedder`]: deterministic feature hashing, no model download,
//!   used offline and in tests
//!
//! Callers go through [`EmbeddingGenerator`], which batches requests and
//! checks every returned vector before handing anything back.
//!
//! # Usage
//!
//! ```ignore
//! use ragdoc_lib::embed::{EmbeddingGenerator, FastEmbedder};
//!
//! let embedder = FastEmbedder::from_model_name("sentence-transformers/all-MiniLM-L6-v2")?;
//! let generator = EmbeddingGenerator::new(embedder, 32);
//!
//! let vectors = generator.embed(&["cats purr", "dogs bark"])?;
//! let query = generator.embed_one("what purrs?")?;
//! ```

use tracing::debug;

use crate::{Error, Result};

/// A vector embedding - fixed size array of floats
pub type Embedding = Vec<f32>;

/// Trait for text embedding models
pub trait Embedder: Send + Sync {
    /// Embed texts, returning one vector per input in the same order.
    fn embed(&self, texts: &[&str]) -> Result<Vec<Embedding>>;

    /// Returns the embedding dimension
    fn dimension(&self) -> usize;

    /// Returns the model name/identifier
    fn model_name(&self) -> &str;
}

// Lets callers pick a backend at runtime
impl<E: Embedder + ?Sized> Embedder for Box<E> {
    fn embed(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        (**self).embed(texts)
    }

    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

/// Batching façade over an [`Embedder`].
///
/// Embedding is all-or-nothing: if any batch fails or comes back malformed
/// (miscounted, mis-sized or non-finite), the whole call fails with
/// [`Error::EmbeddingUnavailable`].
pub struct EmbeddingGenerator<E: Embedder> {
    embedder: E,
    batch_size: usize,
}

impl<E: Embedder> EmbeddingGenerator<E> {
    /// Create a generator sending at most `batch_size` texts per model call.
    #[must_use]
    pub fn new(embedder: E, batch_size: usize) -> Self {
        Self {
            embedder,
            batch_size: batch_size.max(1),
        }
    }

    /// Embed texts, preserving length and order.
    pub fn embed(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        let mut vectors = Vec::with_capacity(texts.len());

        for (i, batch) in texts.chunks(self.batch_size).enumerate() {
            debug!(batch = i, size = batch.len(), "embedding batch");
            let out = self.embedder.embed(batch)?;
            self.check_batch(batch.len(), &out)?;
            vectors.extend(out);
        }

        Ok(vectors)
    }

    /// Embed a single text.
    pub fn embed_one(&self, text: &str) -> Result<Embedding> {
        self.embed(&[text])?
            .into_iter()
            .next()
            .ok_or_else(|| Error::EmbeddingUnavailable("model returned no embeddings".to_string()))
    }

    fn check_batch(&self, expected: usize, out: &[Embedding]) -> Result<()> {
        if out.len() != expected {
            return Err(Error::EmbeddingUnavailable(format!(
                "{} returned {} vectors for {expected} texts",
                self.embedder.model_name(),
                out.len()
            )));
        }

        let dimension = self.embedder.dimension();
        if let Some(bad) = out.iter().find(|v| v.len() != dimension) {
            return Err(Error::EmbeddingUnavailable(format!(
                "{} returned a {}-dimension vector, expected {dimension}",
                self.embedder.model_name(),
                bad.len()
            )));
        }

        if out.iter().flatten().any(|x| !x.is_finite()) {
            return Err(Error::EmbeddingUnavailable(format!(
                "{} returned a vector with non-finite components",
                self.embedder.model_name()
            )));
        }

        Ok(())
    }

    /// Returns the dimension of produced vectors.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.embedder.dimension()
    }

    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Returns a reference to the embedder.
    #[must_use]
    pub fn embedder(&self) -> &E {
        &self.embedder
    }
}

mod hashing;
mod onnx;

pub use hashing::*;
pub use onnx::*;
