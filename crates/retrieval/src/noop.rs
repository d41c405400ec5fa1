//! No-op retriever — context augmentation disabled.

use async_trait::async_trait;

use verdant_core::error::RetrievalError;
use verdant_core::retrieval::{RetrievalAugmenter, RetrievedDocument};

/// A retriever that always returns an empty snapshot.
pub struct NoopRetriever;

#[async_trait]
impl RetrievalAugmenter for NoopRetriever {
    fn name(&self) -> &str {
        "noop"
    }

    async fn search(
        &self,
        _query: &str,
        _k: usize,
    ) -> Result<Vec<RetrievedDocument>, RetrievalError> {
        Ok(Vec::new())
    }
}
