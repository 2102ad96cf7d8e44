use std::hash::{DefaultHasher, Hash, Hasher};

use crate::embed::{Embedder, Embedding};
use crate::Result;

/// Deterministic embedder based on feature hashing.
///
/// Each lowercase word and each of its character trigrams (with `<` `>`
/// word boundary markers) is hashed into one of `dimension` buckets. The
/// bucket counts are L2 normalized. Texts sharing words or word fragments
/// get a positive cosine similarity, so `"cat"` and `"cats"` land close
/// together. No model files, no randomness.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    /// Create an embedder producing vectors of length `dimension`.
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn embed_text(&self, text: &str) -> Embedding {
        let mut vector = vec![0.0f32; self.dimension];

        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let word = word.to_lowercase();
            vector[self.bucket(&word)] += 1.0;

            let marked: Vec<char> = format!("<{word}>").chars().collect();
            for gram in marked.windows(3) {
                vector[self.bucket(gram)] += 0.5;
            }
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }

        vector
    }

    fn bucket<T: Hash + ?Sized>(&self, feature: &T) -> usize {
        let mut hasher = DefaultHasher::new();
        feature.hash(&mut hasher);
        (hasher.finish() % self.dimension as u64) as usize
    }
}

impl Embedder for HashingEmbedder {
    fn model_name(&self) -> &str {
        "hashing-trigram"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}
