//! Bounded decorator — enforces a retrieval deadline.
//!
//! The retrieval contract requires a bounded return time. Wrapping any
//! augmenter in `Bounded` turns an overrun into `RetrievalError::Timeout`,
//! which the agent loop degrades to an empty context.

use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;

use verdant_core::error::RetrievalError;
use verdant_core::retrieval::{RetrievalAugmenter, RetrievedDocument};

/// Wraps a retriever with a wall-clock deadline per search.
pub struct Bounded<R> {
    inner: R,
    deadline: Duration,
}

impl<R: RetrievalAugmenter> Bounded<R> {
    pub fn new(inner: R, deadline: Duration) -> Self {
        Self { inner, deadline }
    }
}

#[async_trait]
impl<R: RetrievalAugmenter> RetrievalAugmenter for Bounded<R> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievedDocument>, RetrievalError> {
        match tokio::time::timeout(self.deadline, self.inner.search(query, k)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    retriever = self.inner.name(),
                    timeout_ms = self.deadline.as_millis() as u64,
                    "Retrieval deadline elapsed"
                );
                Err(RetrievalError::Timeout {
                    timeout_ms: self.deadline.as_millis() as u64,
                })
            }
        }
    }
}
