//! ragdoc - document retrieval library
//!
//! # Architecture
//!
//! ```text
//! Raw records -> Validator -> Embedder -> Store (upsert by identity)
//!                                           |
//! Query -> Embedder -> Similarity search <--+
//!                           |
//!                     Ranked results
//! ```
//!
//! # Example
//!
//! ```ignore
//! use ragdoc_lib::{config::Config, embed::FastEmbedder, search::RetrievalEngine, store::FileStore};
//!
//! let config = Config::default();
//! let embedder = FastEmbedder::from_model_name(&config.model_name)?;
//! let store = FileStore::open(&config.store_path, config.dimension)?;
//! let engine = RetrievalEngine::new(embedder, store, &config)?;
//!
//! // Index documents
//! let raws = ragdoc_lib::document::load_raw_documents("data/search-index.json".as_ref())?;
//! let report = engine.ingest(&raws)?;
//!
//! // Search
//! let results = engine.search("how do cats purr?", 3)?;
//! ```

pub mod config;
pub mod document;
pub mod embed;
pub mod error;
pub mod search;
pub mod store;
pub mod validate;

pub use error::{Error, Result};
