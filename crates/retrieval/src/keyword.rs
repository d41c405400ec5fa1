//! In-memory keyword index — the default retrieval backend.
//!
//! Documents live in a Vec behind an RwLock; search scores by term
//! occurrence normalized by document length. Good enough for field notes
//! and operational runbooks; a vector store slots in behind the same trait
//! when a corpus outgrows it.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use verdant_core::error::RetrievalError;
use verdant_core::retrieval::{RetrievalAugmenter, RetrievedDocument};

struct IndexedDocument {
    content: String,
    metadata: serde_json::Map<String, serde_json::Value>,
}

/// An in-memory keyword-scored document index.
pub struct KeywordIndex {
    documents: Arc<RwLock<Vec<IndexedDocument>>>,
}

impl KeywordIndex {
    pub fn new() -> Self {
        Self {
            documents: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Add a document to the index.
    pub async fn add_document(
        &self,
        content: impl Into<String>,
        metadata: serde_json::Map<String, serde_json::Value>,
    ) {
        self.documents.write().await.push(IndexedDocument {
            content: content.into(),
            metadata,
        });
    }

    /// Number of indexed documents.
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    /// Term-occurrence score normalized by document length.
    fn score(content: &str, terms: &[String]) -> f32 {
        let haystack = content.to_lowercase();
        let hits: usize = terms
            .iter()
            .map(|term| haystack.matches(term.as_str()).count())
            .sum();
        hits as f32 / (content.len() as f32 / 100.0).max(1.0)
    }
}

impl Default for KeywordIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RetrievalAugmenter for KeywordIndex {
    fn name(&self) -> &str {
        "keyword"
    }

    async fn search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievedDocument>, RetrievalError> {
        let terms: Vec<String> = query
            .to_lowercase()
            .split_whitespace()
            .map(String::from)
            .collect();

        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let documents = self.documents.read().await;
        let mut scored: Vec<(f32, &IndexedDocument)> = documents
            .iter()
            .map(|doc| (Self::score(&doc.content, &terms), doc))
            .filter(|(score, _)| *score > 0.0)
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        debug!(
            terms = terms.len(),
            matched = scored.len(),
            corpus = documents.len(),
            "Keyword search complete"
        );

        Ok(scored
            .into_iter()
            .enumerate()
            .map(|(rank, (score, doc))| {
                let mut retrieved = RetrievedDocument::new(doc.content.clone(), rank);
                retrieved.metadata = doc.metadata.clone();
                retrieved
                    .metadata
                    .insert("score".into(), serde_json::json!(score));
                retrieved
            })
            .collect())
    }
}
