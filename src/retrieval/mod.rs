//! Retrieval module for vector search over stored passages
//!
//! [`VectorIndex`] is the seam to the external index; [`PineconeIndex`] is the
//! production implementation. [`Retriever`] pairs an index with an
//! [`Embedder`](crate::embeddings::Embedder) to go from a question straight to passages.

pub mod pinecone;

use std::sync::Arc;

use async_trait::async_trait;
pub use pinecone::PineconeIndex;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::warn;

use crate::embeddings::Embedder;
use crate::errors::RagChatError;
use crate::errors::Result;

/// Name of the vector collection that holds the persona's passages
pub const INDEX_NAME: &str = "domrag2";

/// Number of passages retrieved per question
pub const DEFAULT_TOP_K: usize = 5;

/// One stored passage returned by a similarity search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedPassage {
    /// Record id inside the index
    pub id: String,
    /// Document the passage was cut from, when the index stored it
    pub source_id: Option<String>,
    /// Raw passage text, when the index stored it
    pub text: Option<String>,
    /// Similarity score (higher is more similar)
    pub score: f32,
}

impl RetrievedPassage {
    pub fn new(
        id: impl Into<String>,
        source_id: Option<&str>,
        text: Option<&str>,
        score: f32,
    ) -> Self {
        Self {
            id: id.into(),
            source_id: source_id.map(str::to_string),
            text: text.map(str::to_string),
            score,
        }
    }
}

/// External nearest-neighbour index
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Return at most `top_k` passages ordered by descending similarity
    async fn search(&self, query_vector: &[f32], top_k: usize) -> Result<Vec<RetrievedPassage>>;
}

/// Retriever for semantic search: embed, then query the index
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
}

impl Retriever {
    /// Create a new retriever
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self { embedder, index }
    }

    /// Embed `question` and fetch its nearest passages
    ///
    /// The index ordering is kept as-is; nothing is re-ranked locally.
    pub async fn retrieve(&self, question: &str, top_k: usize) -> Result<Vec<RetrievedPassage>> {
        if top_k == 0 {
            return Err(RagChatError::InvalidInput(
                "top_k must be a positive integer".to_string(),
            ));
        }

        debug!("Performing semantic search: {}", question);
        let query_vector = self.embedder.embed(question).await?;

        let mut passages = self.index.search(&query_vector, top_k).await?;
        if passages.len() > top_k {
            warn!(
                "Index returned {} matches for top_k={}, truncating",
                passages.len(),
                top_k
            );
            passages.truncate(top_k);
        }

        debug!("Retrieved {} passages", passages.len());
        Ok(passages)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use super::*;

    struct FixedEmbedder;

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }
    }

    /// Ignores `top_k` and returns everything it holds, in its own order
    struct OverEagerIndex {
        passages: Vec<RetrievedPassage>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl VectorIndex for OverEagerIndex {
        async fn search(&self, _query: &[f32], _top_k: usize) -> Result<Vec<RetrievedPassage>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.passages.clone())
        }
    }

    fn passages(scores: &[f32]) -> Vec<RetrievedPassage> {
        scores
            .iter()
            .enumerate()
            .map(|(i, score)| {
                RetrievedPassage::new(format!("p{i}"), Some("resume.pdf"), Some("text"), *score)
            })
            .collect()
    }

    fn retriever(index: Arc<OverEagerIndex>) -> Retriever {
        Retriever::new(Arc::new(FixedEmbedder), index)
    }

    #[tokio::test]
    async fn test_never_returns_more_than_top_k() {
        let index = Arc::new(OverEagerIndex {
            passages: passages(&[0.9, 0.8, 0.7, 0.6]),
            calls: AtomicUsize::new(0),
        });

        let results = retriever(index).retrieve("q", 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "p0");
        assert_eq!(results[1].id, "p1");
    }

    #[tokio::test]
    async fn test_preserves_provider_order() {
        // Deliberately not sorted by score
        let index = Arc::new(OverEagerIndex {
            passages: passages(&[0.5, 0.9, 0.7]),
            calls: AtomicUsize::new(0),
        });

        let results = retriever(index).retrieve("q", 5).await.unwrap();
        let ids: Vec<&str> = results.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p0", "p1", "p2"]);
    }

    #[tokio::test]
    async fn test_empty_index_is_not_an_error() {
        let index = Arc::new(OverEagerIndex {
            passages: Vec::new(),
            calls: AtomicUsize::new(0),
        });

        let results = retriever(index).retrieve("q", 5).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_zero_top_k_is_rejected_before_any_call() {
        let index = Arc::new(OverEagerIndex {
            passages: passages(&[0.9]),
            calls: AtomicUsize::new(0),
        });

        let result = retriever(index.clone()).retrieve("q", 0).await;
        assert!(matches!(result, Err(RagChatError::InvalidInput(_))));
        assert_eq!(index.calls.load(Ordering::SeqCst), 0);
    }
}
