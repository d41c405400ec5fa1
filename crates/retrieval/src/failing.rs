//! Always-failing retriever — a fixture for degraded-context behavior.

use async_trait::async_trait;

use verdant_core::error::RetrievalError;
use verdant_core::retrieval::{RetrievalAugmenter, RetrievedDocument};

/// A retriever whose every search fails. Consumers use it to verify that
/// retrieval failure degrades to an empty context instead of aborting.
pub struct FailingRetriever {
    reason: String,
}

impl FailingRetriever {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Default for FailingRetriever {
    fn default() -> Self {
        Self::new("index unreachable")
    }
}

#[async_trait]
impl RetrievalAugmenter for FailingRetriever {
    fn name(&self) -> &str {
        "failing"
    }

    async fn search(
        &self,
        _query: &str,
        _k: usize,
    ) -> Result<Vec<RetrievedDocument>, RetrievalError> {
        Err(RetrievalError::Failed(self.reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn always_fails() {
        let retriever = FailingRetriever::default();
        let err = retriever.search("anything", 3).await.unwrap_err();
        assert!(matches!(err, RetrievalError::Failed(_)));
    }
}
