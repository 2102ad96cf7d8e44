//! Document validation and normalization
//!
//! Raw records arrive from scrapers with arbitrary shapes. The validator
//! either turns a record into a clean [`Document`] or rejects it with a
//! [`Rejection`] explaining why. Nothing partially valid gets through.
//!
//! # Rules
//!
//! - `url`, `title` and `content` must all be present and be strings
//! - the URL is trimmed, defaults to `https://`, and must parse as an
//!   absolute URL; its canonical form becomes the document identity
//! - the title has its whitespace collapsed and falls back to
//!   [`UNTITLED`] when empty
//! - the content is stripped of punctuation (except inside words),
//!   lowercased, and must keep at least `min_words` words
//!
//! # Usage
//!
//! ```ignore
//! use ragdoc_lib::validate::DocumentValidator;
//!
//! let validator = DocumentValidator::new(10);
//! let report = validator.validate_batch(&raw_documents);
//! println!("{} accepted, {} rejected", report.accepted.len(), report.rejected.len());
//! ```

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{Config, DEFAULT_MIN_WORDS};
use crate::document::{Document, DocumentMetadata, RawDocument};

mod normalize;

pub use normalize::*;

/// Title given to documents whose title is empty after cleaning.
pub const UNTITLED: &str = "Untitled";

/// Fields every raw record must carry, in the order they are checked.
pub const REQUIRED_FIELDS: [&str; 3] = ["url", "title", "content"];

/// Why a raw record was not accepted
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Rejection {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("field `{0}` is not a string")]
    NotAString(&'static str),

    #[error("invalid url {0:?}")]
    InvalidUrl(String),

    #[error("content too short: {words} words, need at least {min}")]
    ContentTooShort { words: usize, min: usize },
}

/// Outcome of validating a batch of raw records
#[derive(Debug, Default)]
pub struct ValidationReport {
    /// Documents that passed, in input order
    pub accepted: Vec<Document>,
    /// Input index and reason for every rejected record
    pub rejected: Vec<(usize, Rejection)>,
}

impl ValidationReport {
    /// Total number of records seen.
    #[must_use]
    pub fn total(&self) -> usize {
        self.accepted.len() + self.rejected.len()
    }
}

/// Cleans raw records and accepts or rejects them
#[derive(Debug, Clone)]
pub struct DocumentValidator {
    min_words: usize,
}

impl Default for DocumentValidator {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_WORDS)
    }
}

impl DocumentValidator {
    /// Create a validator requiring at least `min_words` words of content.
    #[must_use]
    pub fn new(min_words: usize) -> Self {
        Self { min_words }
    }

    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.min_words)
    }

    #[must_use]
    pub fn min_words(&self) -> usize {
        self.min_words
    }

    /// Validate and clean a single record.
    pub fn validate(&self, raw: &RawDocument) -> Result<Document, Rejection> {
        let [url, title, content] = REQUIRED_FIELDS.map(|field| string_field(raw, field));
        let (url, title, content) = (url?, title?, content?);

        let identity = clean_url(url).ok_or_else(|| Rejection::InvalidUrl(url.to_string()))?;

        let cleaned_content = clean_content(content);
        let words = word_count(&cleaned_content);
        if words < self.min_words {
            return Err(Rejection::ContentTooShort {
                words,
                min: self.min_words,
            });
        }

        let title = match clean_title(title) {
            t if t.is_empty() => UNTITLED.to_string(),
            t => t,
        };

        let metadata = DocumentMetadata {
            word_count: words,
            original_length: content.len(),
            cleaned_length: cleaned_content.len(),
        };

        Ok(Document {
            identity,
            title,
            content: cleaned_content,
            vector: None,
            metadata: Some(metadata),
        })
    }

    /// Validate every record independently. Rejections are collected, never
    /// raised.
    pub fn validate_batch(&self, raws: &[RawDocument]) -> ValidationReport {
        let mut report = ValidationReport::default();

        for (index, raw) in raws.iter().enumerate() {
            match self.validate(raw) {
                Ok(doc) => report.accepted.push(doc),
                Err(rejection) => {
                    warn!(index, %rejection, "rejected document");
                    report.rejected.push((index, rejection));
                }
            }

            if (index + 1) % 100 == 0 {
                debug!("validated {}/{} documents", index + 1, raws.len());
            }
        }

        info!(
            accepted = report.accepted.len(),
            rejected = report.rejected.len(),
            "validation complete"
        );
        report
    }
}

fn string_field<'a>(raw: &'a RawDocument, field: &'static str) -> Result<&'a str, Rejection> {
    match raw.get(field) {
        None | Some(Value::Null) => Err(Rejection::MissingField(field)),
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(_) => Err(Rejection::NotAString(field)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawDocument {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    const TEN_WORDS: &str = "one two three four five six seven eight nine ten";

    #[test]
    fn test_accepts_valid_document() {
        let validator = DocumentValidator::new(10);
        let doc = validator
            .validate(&raw(json!({
                "url": "example.com/page",
                "title": "  A   Page ",
                "content": TEN_WORDS,
            })))
            .unwrap();

        assert_eq!(doc.identity, "https://example.com/page");
        assert_eq!(doc.title, "A Page");
        assert_eq!(doc.content, TEN_WORDS);
        assert!(doc.vector.is_none());

        let meta = doc.metadata.unwrap();
        assert_eq!(meta.word_count, 10);
        assert_eq!(meta.original_length, TEN_WORDS.len());
    }

    #[test]
    fn test_rejects_short_content() {
        let validator = DocumentValidator::new(10);
        let err = validator
            .validate(&raw(json!({
                "url": "https://example.com",
                "title": "Short",
                "content": "a b c",
            })))
            .unwrap_err();

        assert_eq!(err, Rejection::ContentTooShort { words: 3, min: 10 });
    }

    #[test]
    fn test_short_after_cleaning() {
        // Ten tokens, but most are punctuation only
        let validator = DocumentValidator::new(10);
        let err = validator
            .validate(&raw(json!({
                "url": "https://example.com",
                "title": "Noise",
                "content": "a ! b ? c ... d -- e ;",
            })))
            .unwrap_err();

        assert_eq!(err, Rejection::ContentTooShort { words: 5, min: 10 });
    }

    #[test]
    fn test_missing_fields() {
        let validator = DocumentValidator::default();

        let err = validator
            .validate(&raw(json!({"title": "t", "content": TEN_WORDS})))
            .unwrap_err();
        assert_eq!(err, Rejection::MissingField("url"));

        let err = validator
            .validate(&raw(json!({"url": "example.com", "title": null, "content": TEN_WORDS})))
            .unwrap_err();
        assert_eq!(err, Rejection::MissingField("title"));

        let err = validator
            .validate(&raw(json!({"url": "example.com", "title": "t"})))
            .unwrap_err();
        assert_eq!(err, Rejection::MissingField("content"));
    }

    #[test]
    fn test_non_string_field() {
        let validator = DocumentValidator::default();
        let err = validator
            .validate(&raw(json!({"url": "example.com", "title": 12, "content": TEN_WORDS})))
            .unwrap_err();
        assert_eq!(err, Rejection::NotAString("title"));
    }

    #[test]
    fn test_invalid_url() {
        let validator = DocumentValidator::default();
        let err = validator
            .validate(&raw(json!({"url": "   ", "title": "t", "content": TEN_WORDS})))
            .unwrap_err();
        assert!(matches!(err, Rejection::InvalidUrl(_)));
    }

    #[test]
    fn test_empty_title_gets_placeholder() {
        let validator = DocumentValidator::default();
        let doc = validator
            .validate(&raw(json!({"url": "example.com", "title": " \t ", "content": TEN_WORDS})))
            .unwrap();
        assert_eq!(doc.title, UNTITLED);
    }

    #[test]
    fn test_batch_counts_and_indices() {
        let validator = DocumentValidator::new(10);
        let raws = vec![
            raw(json!({"url": "example.com/a", "title": "A", "content": TEN_WORDS})),
            raw(json!({"url": "example.com/b", "title": "B", "content": "too short"})),
            raw(json!({"title": "C", "content": TEN_WORDS})),
            raw(json!({"url": "example.com/d", "title": "D", "content": TEN_WORDS})),
        ];

        let report = validator.validate_batch(&raws);

        assert_eq!(report.total(), 4);
        assert_eq!(report.accepted.len(), 2);
        assert_eq!(report.accepted[0].identity, "https://example.com/a");
        assert_eq!(report.accepted[1].identity, "https://example.com/d");

        let indices: Vec<usize> = report.rejected.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![1, 2]);
    }

    #[test]
    fn test_empty_batch() {
        let report = DocumentValidator::default().validate_batch(&[]);
        assert_eq!(report.total(), 0);
    }
}
