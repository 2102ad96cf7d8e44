//! Runtime configuration
//!
//! Every component takes its settings from an explicit [`Config`] value, so
//! stores and engines with different settings can live side by side.
//!
//! ```toml
//! model_name = "sentence-transformers/all-MiniLM-L6-v2"
//! dimension = 384
//! batch_size = 32
//! default_top_k = 2
//! min_words = 10
//! store_path = "data/ragdoc-store.json"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default embedding model, a 384-dimension sentence transformer.
pub const DEFAULT_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Default number of results returned by a query.
pub const DEFAULT_TOP_K: usize = 2;

/// Documents with fewer cleaned words than this carry no retrieval value.
pub const DEFAULT_MIN_WORDS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Embedding model identifier
    pub model_name: String,
    /// Vector length produced by the model and accepted by the store
    pub dimension: usize,
    /// Number of texts sent to the model per call
    pub batch_size: usize,
    /// `top_k` used when a query does not specify one
    pub default_top_k: usize,
    /// Minimum word count of cleaned content
    pub min_words: usize,
    /// Location of the file-backed store snapshot
    pub store_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_name: DEFAULT_MODEL.to_string(),
            dimension: 384,
            batch_size: 32,
            default_top_k: DEFAULT_TOP_K,
            min_words: DEFAULT_MIN_WORDS,
            store_path: PathBuf::from("data/ragdoc-store.json"),
        }
    }
}

impl Config {
    /// Parse a TOML document. Missing keys take their default values.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(s).map_err(|e| Error::Config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Apply `RAGDOC_*` environment overrides on top of the current values.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(model) = lookup("RAGDOC_MODEL") {
            self.model_name = model;
        }
        if let Some(v) = lookup("RAGDOC_DIMENSION") {
            self.dimension = parse_usize("RAGDOC_DIMENSION", &v)?;
        }
        if let Some(v) = lookup("RAGDOC_BATCH_SIZE") {
            self.batch_size = parse_usize("RAGDOC_BATCH_SIZE", &v)?;
        }
        if let Some(v) = lookup("RAGDOC_TOP_K") {
            self.default_top_k = parse_usize("RAGDOC_TOP_K", &v)?;
        }
        if let Some(v) = lookup("RAGDOC_MIN_WORDS") {
            self.min_words = parse_usize("RAGDOC_MIN_WORDS", &v)?;
        }
        if let Some(path) = lookup("RAGDOC_STORE_PATH") {
            self.store_path = PathBuf::from(path);
        }
        self.validate()
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.model_name.trim().is_empty() {
            return Err(Error::Config("model_name must not be empty".into()));
        }
        if self.dimension == 0 {
            return Err(Error::Config("dimension must be greater than 0".into()));
        }
        if self.batch_size == 0 {
            return Err(Error::Config("batch_size must be greater than 0".into()));
        }
        if self.default_top_k == 0 {
            return Err(Error::Config("default_top_k must be greater than 0".into()));
        }
        if self.min_words == 0 {
            return Err(Error::Config("min_words must be greater than 0".into()));
        }
        Ok(())
    }
}

fn parse_usize(key: &str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse()
        .map_err(|e| Error::Config(format!("{key}={value:?} is not a positive integer: {e}")))
}
