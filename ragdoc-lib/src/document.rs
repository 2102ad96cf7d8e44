//! Documents and query results
//!
//! A [`Document`] is the unit of retrieval. It is produced by the validator,
//! gains a vector from the embedder, and is persisted by a store keyed on
//! its identity (the canonical URL).

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::embed::Embedding;
use crate::{Error, Result};

/// A raw ingestion record: a JSON object with `url`, `title` and `content`
/// keys of unknown shape.
pub type RawDocument = Map<String, Value>;

/// A validated document, optionally carrying its embedding
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Canonical absolute URL; the primary key
    pub identity: String,
    /// Human readable label
    pub title: String,
    /// Normalized lowercase text
    pub content: String,
    /// Embedding, absent until the document has been through an embedder
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<Embedding>,
    /// Informational statistics captured during validation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<DocumentMetadata>,
}

impl Document {
    /// Returns `true` if the document carries a vector.
    #[must_use]
    pub fn is_embedded(&self) -> bool {
        self.vector.is_some()
    }

    /// Attach a vector, replacing any previous one.
    #[must_use]
    pub fn with_vector(mut self, vector: Embedding) -> Self {
        self.vector = Some(vector);
        self
    }
}

/// Statistics recorded by the validator. Never used for ranking.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct DocumentMetadata {
    /// Number of whitespace separated tokens in the cleaned content
    pub word_count: usize,
    /// Length in bytes of the content as received
    pub original_length: usize,
    /// Length in bytes of the cleaned content
    pub cleaned_length: usize,
}

/// A search hit. Vectors never leave the store, so this only carries the
/// document's text fields and its similarity to the query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedResult {
    pub identity: String,
    pub title: String,
    pub content: String,
    /// Cosine similarity to the query, in [-1, 1]
    pub score: f32,
}

/// Read a JSON array of raw records from disk.
pub fn load_raw_documents(path: &Path) -> Result<Vec<RawDocument>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| Error::InvalidInput(format!("failed to read {}: {e}", path.display())))?;
    parse_raw_documents(&text)
}

/// Parse a JSON array of raw records. Array elements that are not objects
/// are kept as empty records so the validator reports them as missing
/// fields and input indices stay aligned.
pub fn parse_raw_documents(text: &str) -> Result<Vec<RawDocument>> {
    let values: Vec<Value> = serde_json::from_str(text)
        .map_err(|e| Error::InvalidInput(format!("input is not a JSON array: {e}")))?;

    Ok(values
        .into_iter()
        .map(|value| match value {
            Value::Object(map) => map,
            _ => Map::new(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_raw_documents() {
        let raws = parse_raw_documents(
            r#"[{"url": "example.com/a", "title": "A", "content": "x"}, 42, {"title": 7}]"#,
        )
        .unwrap();

        assert_eq!(raws.len(), 3);
        assert_eq!(raws[0]["url"], "example.com/a");
        assert!(raws[1].is_empty());
        assert_eq!(raws[2]["title"], 7);
    }

    #[test]
    fn test_parse_rejects_non_array() {
        let err = parse_raw_documents(r#"{"url": "example.com"}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_load_missing_input_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_raw_documents(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_vector_not_serialized_when_absent() {
        let doc = Document {
            identity: "https://example.com/".into(),
            title: "Example".into(),
            content: "example".into(),
            vector: None,
            metadata: None,
        };
        let json = serde_json::to_string(&doc).unwrap();
        assert!(!json.contains("vector"));
        assert!(!doc.is_embedded());
        assert!(doc.with_vector(vec![1.0]).is_embedded());
    }
}
