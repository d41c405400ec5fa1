//! RetrievalAugmenter trait — context retrieval for reasoning prompts.
//!
//! Given a free-text query and a result count, a retriever returns a finite,
//! ordered snapshot of relevant context documents (possibly empty). Retrieval
//! is a best-effort enrichment: the agent loop treats any failure as an empty
//! snapshot and proceeds — retrieval must never block reasoning.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RetrievalError;

/// A single retrieved context document. Immutable snapshot value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedDocument {
    /// The document content
    pub content: String,

    /// Relevance rank within the result set (0 = most relevant)
    pub rank: usize,

    /// Source metadata (origin, tags, scores)
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl RetrievedDocument {
    pub fn new(content: impl Into<String>, rank: usize) -> Self {
        Self {
            content: content.into(),
            rank,
            metadata: serde_json::Map::new(),
        }
    }
}

/// The core RetrievalAugmenter trait.
///
/// Implementations: in-memory keyword index, no-op, bounded decorator.
#[async_trait]
pub trait RetrievalAugmenter: Send + Sync {
    /// The retriever name (e.g., "keyword", "noop").
    fn name(&self) -> &str;

    /// Search for up to `k` relevant documents, ordered by descending
    /// relevance. Must return within a bounded time or fail with
    /// `RetrievalError::Timeout`.
    async fn search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievedDocument>, RetrievalError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_serialization() {
        let mut doc = RetrievedDocument::new("NDVI trend for block 7 is declining", 0);
        doc.metadata
            .insert("source".into(), serde_json::json!("field_notes"));
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("block 7"));
        assert!(json.contains("field_notes"));
    }
}
