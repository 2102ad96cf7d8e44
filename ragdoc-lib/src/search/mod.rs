//! High-level retrieval interface
//!
//! Combines validator, embedder and store into the ingestion pipeline and
//! the query entry point.
//!
//! # Usage
//!
//! ```ignore
//! use ragdoc_lib::search::RetrievalEngine;
//!
//! let engine = RetrievalEngine::new(embedder, store, &config)?;
//! let report = engine.ingest(&raw_documents)?;
//! let results = engine.search("how do cats purr?", 3)?;
//! ```

use serde::Serialize;
use tracing::{debug, info};

use crate::config::Config;
use crate::document::{RankedResult, RawDocument};
use crate::embed::{Embedder, EmbeddingGenerator};
use crate::store::{Skipped, UpsertReport, VectorStore};
use crate::validate::{DocumentValidator, Rejection};
use crate::{Error, Result};

/// Outcome of an ingestion run
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    /// Records that passed validation
    pub accepted: usize,
    /// Input index and reason for every record that failed validation
    pub rejected: Vec<(usize, Rejection)>,
    /// Accepted documents new to the store
    pub inserted: usize,
    /// Accepted documents that replaced a stored one
    pub replaced: usize,
    /// Accepted documents the store refused
    pub skipped: Vec<Skipped>,
}

/// Retrieval engine combining validation, embedding and storage.
///
/// All methods take `&self`; share an engine between threads with `Arc`.
pub struct RetrievalEngine<E: Embedder, S: VectorStore> {
    validator: DocumentValidator,
    generator: EmbeddingGenerator<E>,
    store: S,
    default_top_k: usize,
}

impl<E: Embedder, S: VectorStore> RetrievalEngine<E, S> {
    /// Create an engine. Fails if the embedder and store disagree on the
    /// vector dimension.
    pub fn new(embedder: E, store: S, config: &Config) -> Result<Self> {
        if embedder.dimension() != store.dimension() {
            return Err(Error::Config(format!(
                "embedder {} produces {}-dimension vectors but the store expects {}",
                embedder.model_name(),
                embedder.dimension(),
                store.dimension()
            )));
        }

        Ok(Self {
            validator: DocumentValidator::from_config(config),
            generator: EmbeddingGenerator::new(embedder, config.batch_size),
            store,
            default_top_k: config.default_top_k,
        })
    }

    /// Validate, embed and upsert raw records.
    ///
    /// Rejected records are counted, not raised. Accepted documents are
    /// embedded and upserted one batch at a time; an embedding or
    /// persistence failure aborts the run, leaving earlier batches stored.
    pub fn ingest(&self, raws: &[RawDocument]) -> Result<IngestReport> {
        let validation = self.validator.validate_batch(raws);

        let mut upserted = UpsertReport::default();
        let batch_size = self.generator.batch_size();

        for (i, batch) in validation.accepted.chunks(batch_size).enumerate() {
            let texts: Vec<&str> = batch.iter().map(|d| d.content.as_str()).collect();
            let vectors = self.generator.embed(&texts)?;

            let embedded: Vec<_> = batch
                .iter()
                .cloned()
                .zip(vectors)
                .map(|(doc, vector)| doc.with_vector(vector))
                .collect();

            let mut report = self.store.upsert(&embedded)?;
            // report input positions relative to the whole accepted list
            for skipped in &mut report.skipped {
                skipped.index += i * batch_size;
            }
            upserted.merge(report);
            debug!(batch = i, "ingested batch");
        }

        let report = IngestReport {
            accepted: validation.accepted.len(),
            rejected: validation.rejected,
            inserted: upserted.inserted,
            replaced: upserted.replaced,
            skipped: upserted.skipped,
        };

        info!(
            accepted = report.accepted,
            rejected = report.rejected.len(),
            inserted = report.inserted,
            replaced = report.replaced,
            skipped = report.skipped.len(),
            "ingestion complete"
        );
        Ok(report)
    }

    /// Validate, embed and upsert a single raw record.
    ///
    /// Unlike [`ingest`](Self::ingest), a rejected record is returned as
    /// [`Error::Validation`].
    pub fn ingest_one(&self, raw: &RawDocument) -> Result<UpsertReport> {
        let doc = self.validator.validate(raw)?;
        let vector = self.generator.embed_one(&doc.content)?;
        self.store.upsert(&[doc.with_vector(vector)])
    }

    /// Search for documents similar to the query text.
    ///
    /// Results come straight from the store: at most `top_k`, best first.
    /// `top_k == 0` yields an empty list.
    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<RankedResult>> {
        if query.trim().is_empty() {
            return Err(Error::InvalidQuery("query text is empty".to_string()));
        }

        let query_vector = self.generator.embed_one(query)?;
        let results = self.store.similarity_search(&query_vector, top_k)?;

        debug!(top_k, hits = results.len(), "search complete");
        Ok(results)
    }

    /// Search with the configured default `top_k`.
    pub fn search_default(&self, query: &str) -> Result<Vec<RankedResult>> {
        self.search(query, self.default_top_k)
    }

    #[must_use]
    pub fn default_top_k(&self) -> usize {
        self.default_top_k
    }

    /// Returns the number of stored documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns `true` if no documents are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Returns a reference to the embedder.
    #[must_use]
    pub fn embedder(&self) -> &E {
        self.generator.embedder()
    }

    /// Returns a reference to the store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn validator(&self) -> &DocumentValidator {
        &self.validator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::{Embedding, HashingEmbedder};
    use crate::store::MemoryStore;
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn raw(value: Value) -> RawDocument {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    fn config(dimension: usize) -> Config {
        Config {
            dimension,
            batch_size: 2,
            ..Config::default()
        }
    }

    fn hashing_engine() -> RetrievalEngine<HashingEmbedder, MemoryStore> {
        hashing_engine_with(config(64))
    }

    fn hashing_engine_with(config: Config) -> RetrievalEngine<HashingEmbedder, MemoryStore> {
        let dimension = config.dimension;
        RetrievalEngine::new(
            HashingEmbedder::new(dimension),
            MemoryStore::new(dimension),
            &config,
        )
        .unwrap()
    }

    struct DownEmbedder;

    impl Embedder for DownEmbedder {
        fn embed(&self, _texts: &[&str]) -> Result<Vec<Embedding>> {
            Err(Error::EmbeddingUnavailable("connection refused".into()))
        }
        fn dimension(&self) -> usize {
            64
        }
        fn model_name(&self) -> &str {
            "down"
        }
    }

    #[test]
    fn test_end_to_end_cats() {
        // the sample document has eight words
        let engine = hashing_engine_with(Config {
            min_words: 5,
            ..config(384)
        });
        let report = engine
            .ingest(&[raw(json!({
                "url": "example.com/a",
                "title": "Cats",
                "content": "cats are small domesticated carnivorous mammals that purr",
            }))])
            .unwrap();

        assert_eq!(report.accepted, 1);
        assert_eq!(report.inserted, 1);

        let results = engine.search_default("cat").unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].identity, "https://example.com/a");
        assert_eq!(results[0].title, "Cats");
        assert!(results[0].score > 0.0);
    }

    #[test]
    fn test_ingest_counts_rejections() {
        let engine = hashing_engine();
        let report = engine
            .ingest(&[
                raw(json!({"url": "example.com/a", "title": "A", "content": "one two three four five six seven eight nine ten"})),
                raw(json!({"url": "example.com/b", "title": "B", "content": "a b c"})),
                raw(json!({"title": "C"})),
            ])
            .unwrap();

        assert_eq!(report.accepted, 1);
        assert_eq!(report.rejected.len(), 2);
        assert_eq!(report.rejected[0].0, 1);
        assert_eq!(report.rejected[1].0, 2);
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn test_ingest_twice_replaces() {
        let engine = hashing_engine();
        let raws: Vec<RawDocument> = (0..5)
            .map(|i| {
                raw(json!({
                    "url": format!("example.com/{i}"),
                    "title": format!("Doc {i}"),
                    "content": format!("document number {i} talks about many different interesting things here"),
                }))
            })
            .collect();

        let first = engine.ingest(&raws).unwrap();
        let second = engine.ingest(&raws).unwrap();

        assert_eq!(first.inserted, 5);
        assert_eq!(second.inserted, 0);
        assert_eq!(second.replaced, 5);
        assert_eq!(engine.len(), 5);
    }

    #[test]
    fn test_ingest_one_raises_rejection() {
        let engine = hashing_engine();

        let err = engine
            .ingest_one(&raw(json!({"url": "example.com/b", "title": "B", "content": "a b c"})))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(Rejection::ContentTooShort { words: 3, min: 10 })
        ));
        assert!(engine.is_empty());

        let report = engine
            .ingest_one(&raw(json!({
                "url": "example.com/a",
                "title": "A",
                "content": "one two three four five six seven eight nine ten",
            })))
            .unwrap();
        assert_eq!(report.inserted, 1);
        assert!(engine.store().get("https://example.com/a").unwrap().is_embedded());
    }

    #[test]
    fn test_empty_query_rejected() {
        let engine = hashing_engine();
        assert!(matches!(engine.search("", 3), Err(Error::InvalidQuery(_))));
        assert!(matches!(engine.search("  \n\t", 3), Err(Error::InvalidQuery(_))));
    }

    #[test]
    fn test_zero_top_k_is_empty() {
        let engine = hashing_engine();
        engine
            .ingest(&[raw(json!({
                "url": "example.com",
                "title": "T",
                "content": "one two three four five six seven eight nine ten",
            }))])
            .unwrap();

        assert!(engine.search("one", 0).unwrap().is_empty());
    }

    #[test]
    fn test_embedding_failure_propagates() {
        let engine =
            RetrievalEngine::new(DownEmbedder, MemoryStore::new(64), &config(64)).unwrap();

        assert!(matches!(
            engine.search("anything", 2),
            Err(Error::EmbeddingUnavailable(_))
        ));

        let err = engine
            .ingest(&[raw(json!({
                "url": "example.com",
                "title": "T",
                "content": "one two three four five six seven eight nine ten",
            }))])
            .unwrap_err();
        assert!(matches!(err, Error::EmbeddingUnavailable(_)));
        assert!(engine.is_empty());
    }

    #[test]
    fn test_dimension_disagreement_rejected() {
        let result = RetrievalEngine::new(HashingEmbedder::new(32), MemoryStore::new(64), &config(64));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_concurrent_searches() {
        let engine = Arc::new(hashing_engine());
        let raws: Vec<RawDocument> = ["cats purr", "dogs bark", "birds sing"]
            .iter()
            .enumerate()
            .map(|(i, topic)| {
                raw(json!({
                    "url": format!("example.com/{i}"),
                    "title": topic,
                    "content": format!("{topic} loudly every single morning before the sun comes up"),
                }))
            })
            .collect();
        engine.ingest(&raws).unwrap();

        let expected = engine.search("cats", 3).unwrap();

        std::thread::scope(|s| {
            for _ in 0..4 {
                let engine = Arc::clone(&engine);
                let expected = expected.clone();
                s.spawn(move || {
                    for _ in 0..10 {
                        assert_eq!(engine.search("cats", 3).unwrap(), expected);
                    }
                });
            }
        });
    }
}
