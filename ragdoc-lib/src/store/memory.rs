use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::document::{Document, RankedResult};
use crate::store::{cosine_similarity, top_k, Scored, SkipReason, Skipped, UpsertReport, VectorStore};
use crate::{Error, Result};

/// In-memory document store.
///
/// Uses brute-force cosine similarity search. Suitable for small datasets
/// (thousands of documents). Reads share a lock; each upserted record takes
/// the write lock on its own, so the last writer of an identity wins and
/// concurrent batches interleave record by record.
pub struct MemoryStore {
    dimension: usize,
    records: RwLock<HashMap<String, Document>>,
}

impl MemoryStore {
    /// Create a new empty store accepting vectors of length `dimension`.
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Create a store pre-populated with documents, e.g. from a snapshot.
    /// Documents are checked the same way as in [`VectorStore::upsert`].
    pub fn with_documents(dimension: usize, documents: Vec<Document>) -> Result<Self> {
        let store = Self::new(dimension);
        let report = store.upsert(&documents)?;
        if let Some(first) = report.skipped.first() {
            return Err(Error::Persistence(format!(
                "stored record {} is invalid: {}",
                first.identity, first.reason
            )));
        }
        Ok(store)
    }

    /// Every stored document in identity order, vectors included.
    pub fn documents(&self) -> Vec<Document> {
        let records = self.records.read();
        let mut docs: Vec<Document> = records.values().cloned().collect();
        docs.sort_by(|a, b| a.identity.cmp(&b.identity));
        docs
    }

    fn check(&self, doc: &Document) -> std::result::Result<(), SkipReason> {
        if doc.identity.trim().is_empty() {
            return Err(SkipReason::EmptyField("identity"));
        }
        if doc.title.trim().is_empty() {
            return Err(SkipReason::EmptyField("title"));
        }
        if doc.content.trim().is_empty() {
            return Err(SkipReason::EmptyField("content"));
        }
        if let Some(vector) = &doc.vector {
            if vector.len() != self.dimension {
                return Err(SkipReason::WrongDimension {
                    expected: self.dimension,
                    actual: vector.len(),
                });
            }
            if vector.iter().any(|x| !x.is_finite()) {
                return Err(SkipReason::NonFiniteVector);
            }
        }
        Ok(())
    }
}

impl VectorStore for MemoryStore {
    fn upsert(&self, documents: &[Document]) -> Result<UpsertReport> {
        let mut report = UpsertReport::default();

        for (index, doc) in documents.iter().enumerate() {
            if let Err(reason) = self.check(doc) {
                warn!(index, identity = %doc.identity, %reason, "skipping document");
                report.skipped.push(Skipped {
                    index,
                    identity: doc.identity.clone(),
                    reason,
                });
                continue;
            }

            let mut records = self.records.write();
            let existing = records.get(&doc.identity);

            if doc.vector.is_none() && existing.is_some_and(Document::is_embedded) {
                drop(records);
                let reason = SkipReason::WouldDropVector;
                warn!(index, identity = %doc.identity, %reason, "skipping document");
                report.skipped.push(Skipped {
                    index,
                    identity: doc.identity.clone(),
                    reason,
                });
                continue;
            }

            match records.insert(doc.identity.clone(), doc.clone()) {
                Some(_) => report.replaced += 1,
                None => report.inserted += 1,
            }
        }

        info!(
            inserted = report.inserted,
            replaced = report.replaced,
            skipped = report.skipped.len(),
            "upsert complete"
        );
        Ok(report)
    }

    fn similarity_search(&self, query: &[f32], k: usize) -> Result<Vec<RankedResult>> {
        if query.len() != self.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let records = self.records.read();

        let candidates = records.values().filter_map(|doc| {
            doc.vector.as_ref().map(|vector| Scored {
                identity: doc.identity.as_str(),
                score: cosine_similarity(query, vector),
            })
        });

        Ok(top_k(candidates, k)
            .into_iter()
            .filter_map(|scored| {
                records.get(scored.identity).map(|doc| RankedResult {
                    identity: doc.identity.clone(),
                    title: doc.title.clone(),
                    content: doc.content.clone(),
                    score: scored.score,
                })
            })
            .collect())
    }

    fn get(&self, identity: &str) -> Option<Document> {
        self.records.read().get(identity).cloned()
    }

    fn sample(&self, n: usize) -> Vec<Document> {
        let records = self.records.read();
        let mut identities: Vec<&String> = records.keys().collect();
        identities.sort();

        identities
            .into_iter()
            .take(n)
            .filter_map(|id| records.get(id))
            .map(|doc| Document {
                vector: None,
                ..doc.clone()
            })
            .collect()
    }

    fn len(&self) -> usize {
        self.records.read().len()
    }

    fn embedded_len(&self) -> usize {
        self.records
            .read()
            .values()
            .filter(|doc| doc.is_embedded())
            .count()
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn clear(&self) -> Result<usize> {
        let mut records = self.records.write();
        let removed = records.len();
        records.clear();
        info!(removed, "store cleared");
        Ok(removed)
    }
}
