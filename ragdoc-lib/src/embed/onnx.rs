use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use parking_lot::Mutex;

use crate::embed::{Embedder, Embedding};
use crate::{Error, Result};

/// Models the fastembed backend knows how to load, with their dimensions.
const MODELS: [(&str, EmbeddingModel, usize); 5] = [
    (
        "sentence-transformers/all-MiniLM-L6-v2",
        EmbeddingModel::AllMiniLML6V2,
        384,
    ),
    (
        "sentence-transformers/all-MiniLM-L12-v2",
        EmbeddingModel::AllMiniLML12V2,
        384,
    ),
    ("BAAI/bge-small-en-v1.5", EmbeddingModel::BGESmallENV15, 384),
    ("BAAI/bge-base-en-v1.5", EmbeddingModel::BGEBaseENV15, 768),
    ("BAAI/bge-large-en-v1.5", EmbeddingModel::BGELargeENV15, 1024),
];

/// Local ONNX embedder backed by fastembed.
///
/// Inference needs exclusive access to the session, so calls are serialized
/// behind a mutex; the embedder itself can be shared between threads.
pub struct FastEmbedder {
    model: Mutex<TextEmbedding>,
    name: &'static str,
    dimension: usize,
}

impl FastEmbedder {
    /// Load the model registered under `name`.
    ///
    /// Downloads the model on first use (~90MB for all-MiniLM-L6-v2).
    pub fn from_model_name(name: &str) -> Result<Self> {
        let (name, model, dimension) = lookup(name)?;

        let opts = InitOptions::new(model).with_show_download_progress(true);

        TextEmbedding::try_new(opts)
            .map(|model| Self {
                model: Mutex::new(model),
                name,
                dimension,
            })
            .map_err(|e| Error::EmbeddingUnavailable(format!("failed to load {name}: {e}")))
    }

    /// Names accepted by [`FastEmbedder::from_model_name`].
    pub fn supported_models() -> impl Iterator<Item = &'static str> {
        MODELS.iter().map(|(name, _, _)| *name)
    }
}

/// Expected vector length for a supported model name.
pub fn model_dimension(name: &str) -> Option<usize> {
    lookup(name).ok().map(|(_, _, dimension)| dimension)
}

fn lookup(name: &str) -> Result<(&'static str, EmbeddingModel, usize)> {
    MODELS
        .iter()
        .find(|(known, _, _)| known.eq_ignore_ascii_case(name))
        .map(|(known, model, dimension)| (*known, model.clone(), *dimension))
        .ok_or_else(|| Error::Config(format!("unsupported embedding model {name:?}")))
}

impl Embedder for FastEmbedder {
    fn model_name(&self) -> &str {
        self.name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        self.model
            .lock()
            .embed(texts.to_vec(), None)
            .map_err(|e| Error::EmbeddingUnavailable(e.to_string()))
    }
}
