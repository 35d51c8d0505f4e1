//! Cosine-similarity retrieval over a loaded [`VectorIndex`].

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

use docrag_llm::LlmProvider;

use crate::builder::{embed_with_timeout, ensure_embeddings};
use crate::error::IndexError;
use crate::index::VectorIndex;

#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Maximum number of chunks returned.
    pub top_k: usize,
    /// Chunks scoring below this cosine similarity are dropped.
    pub score_threshold: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            score_threshold: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub source: String,
    pub chunk_index: usize,
    pub content: String,
    pub score: f32,
}

/// Ranked chunks, best match first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievedContext {
    pub chunks: Vec<ScoredChunk>,
}

impl RetrievedContext {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Chunk contents joined by blank lines, in rank order.
    #[must_use]
    pub fn text(&self) -> String {
        self.chunks
            .iter()
            .map(|c| c.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

pub struct Retriever<P: LlmProvider> {
    provider: Arc<P>,
    config: RetrievalConfig,
    embed_timeout: Duration,
}

impl<P: LlmProvider> Retriever<P> {
    #[must_use]
    pub fn new(provider: Arc<P>, config: RetrievalConfig, embed_timeout: Duration) -> Self {
        Self {
            provider,
            config,
            embed_timeout,
        }
    }

    /// Find the chunks of `index` most similar to `query`.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::EmptyIndex`] if the index has no entries, or an
    /// embedding error if the provider cannot embed the query.
    pub async fn retrieve(
        &self,
        query: &str,
        index: &VectorIndex,
    ) -> Result<RetrievedContext, IndexError> {
        if index.is_empty() {
            return Err(IndexError::EmptyIndex);
        }
        ensure_embeddings(&*self.provider)?;

        let query_vector = embed_with_timeout(&*self.provider, query, self.embed_timeout).await?;
        if query_vector.len() != index.dimensions {
            return Err(IndexError::DimensionMismatch {
                expected: index.dimensions,
                actual: query_vector.len(),
            });
        }

        let chunks = rank(index, &query_vector, &self.config);
        tracing::debug!(
            hits = chunks.len(),
            top_score = chunks.first().map(|c| c.score),
            "retrieval finished"
        );
        Ok(RetrievedContext { chunks })
    }
}

/// Score every entry and keep the best `top_k` above the threshold.
/// Ties are broken by source path, then chunk position.
#[must_use]
pub fn rank(
    index: &VectorIndex,
    query_vector: &[f32],
    config: &RetrievalConfig,
) -> Vec<ScoredChunk> {
    let mut scored: Vec<ScoredChunk> = index
        .entries
        .iter()
        .map(|entry| ScoredChunk {
            source: entry.source.clone(),
            chunk_index: entry.chunk_index,
            content: entry.content.clone(),
            score: cosine_similarity(query_vector, &entry.vector),
        })
        .filter(|c| c.score >= config.score_threshold)
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.source.cmp(&b.source))
            .then_with(|| a.chunk_index.cmp(&b.chunk_index))
    });
    scored.truncate(config.top_k);
    scored
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use docrag_llm::mock::MockProvider;

    use super::*;
    use crate::builder::IndexBuilder;
    use crate::document::Document;
    use crate::splitter::{SplitterConfig, TextSplitter};
    use crate::store::IndexStore;

    const TIMEOUT: Duration = Duration::from_secs(5);

    async fn build(provider: &Arc<MockProvider>, docs: &[Document]) -> VectorIndex {
        IndexBuilder::new(
            Arc::clone(provider),
            TextSplitter::new(SplitterConfig::default()),
            "mock-embed",
            TIMEOUT,
        )
        .build(docs)
        .await
        .unwrap()
    }

    fn corpus() -> Vec<Document> {
        vec![
            Document::new("a.txt", "text/plain", "The sky is blue."),
            Document::new("b.txt", "text/plain", "Bananas are yellow fruit."),
            Document::new("c.txt", "text/plain", "Rust has a borrow checker."),
        ]
    }

    #[test]
    fn cosine_similarity_cases() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < f32::EPSILON);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < f32::EPSILON);
        assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn empty_index_is_an_error() {
        let provider = Arc::new(MockProvider::default());
        let retriever = Retriever::new(Arc::clone(&provider), RetrievalConfig::default(), TIMEOUT);
        let err = retriever
            .retrieve("anything", &VectorIndex::empty("m"))
            .await
            .unwrap_err();
        assert!(matches!(err, IndexError::EmptyIndex));
    }

    #[tokio::test]
    async fn best_match_ranks_first() {
        let provider = Arc::new(MockProvider::default());
        let index = build(&provider, &corpus()).await;
        let retriever = Retriever::new(Arc::clone(&provider), RetrievalConfig::default(), TIMEOUT);

        let context = retriever
            .retrieve("What color is the sky?", &index)
            .await
            .unwrap();
        assert_eq!(context.chunks[0].source, "a.txt");
        assert!(context.text().contains("sky is blue"));
    }

    #[tokio::test]
    async fn top_k_and_threshold_limit_results() {
        let provider = Arc::new(MockProvider::default());
        let index = build(&provider, &corpus()).await;

        let top_one = Retriever::new(
            Arc::clone(&provider),
            RetrievalConfig {
                top_k: 1,
                score_threshold: 0.0,
            },
            TIMEOUT,
        );
        assert_eq!(top_one.retrieve("sky", &index).await.unwrap().chunks.len(), 1);

        let strict = Retriever::new(
            Arc::clone(&provider),
            RetrievalConfig {
                top_k: 10,
                score_threshold: 0.99,
            },
            TIMEOUT,
        );
        let context = strict.retrieve("zebra crossing", &index).await.unwrap();
        assert!(context.is_empty());
        assert_eq!(context.text(), "");
    }

    #[tokio::test]
    async fn retrieval_does_not_mutate_index() {
        let provider = Arc::new(MockProvider::default());
        let index = build(&provider, &corpus()).await;
        let before = index.clone();
        let retriever = Retriever::new(Arc::clone(&provider), RetrievalConfig::default(), TIMEOUT);
        retriever.retrieve("borrow checker", &index).await.unwrap();
        assert_eq!(index, before);
    }

    #[tokio::test]
    async fn loaded_index_retrieves_like_built_index() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(MockProvider::default());
        let built = build(&provider, &corpus()).await;

        let store = IndexStore::new(dir.path().join("index.json"));
        store.persist(&built).await.unwrap();
        let loaded = store.load().await.unwrap();

        let retriever = Retriever::new(Arc::clone(&provider), RetrievalConfig::default(), TIMEOUT);
        for query in ["sky color", "yellow bananas", "borrow checker in rust"] {
            assert_eq!(
                retriever.retrieve(query, &built).await.unwrap(),
                retriever.retrieve(query, &loaded).await.unwrap()
            );
        }
    }

    #[tokio::test]
    async fn query_dimension_mismatch_is_reported() {
        let provider = Arc::new(MockProvider::default());
        let index = build(&provider, &corpus()).await;
        let narrow = Arc::new(MockProvider::default().with_embedding_dims(8));
        let retriever = Retriever::new(narrow, RetrievalConfig::default(), TIMEOUT);
        let err = retriever.retrieve("sky", &index).await.unwrap_err();
        assert!(matches!(
            err,
            IndexError::DimensionMismatch {
                expected: 64,
                actual: 8
            }
        ));
    }

    #[test]
    fn ties_break_by_source_then_position() {
        let mut index = VectorIndex::empty("m");
        for (source, pos) in [("b.txt", 0), ("a.txt", 1), ("a.txt", 0)] {
            index.entries.push(crate::index::IndexEntry {
                id: format!("{source}{pos}"),
                source: source.into(),
                chunk_index: pos,
                content: String::new(),
                vector: vec![1.0],
            });
        }
        index.dimensions = 1;
        let ranked = rank(&index, &[1.0], &RetrievalConfig::default());
        let order: Vec<_> = ranked
            .iter()
            .map(|c| (c.source.as_str(), c.chunk_index))
            .collect();
        assert_eq!(order, vec![("a.txt", 0), ("a.txt", 1), ("b.txt", 0)]);
    }

    #[tokio::test]
    async fn chat_only_provider_is_rejected() {
        let index = build(&Arc::new(MockProvider::default()), &corpus()).await;
        let retriever = Retriever::new(
            Arc::new(MockProvider::without_embeddings()),
            RetrievalConfig::default(),
            TIMEOUT,
        );
        let err = retriever.retrieve("sky", &index).await.unwrap_err();
        assert!(matches!(
            err,
            IndexError::Embedding(docrag_llm::LlmError::EmbedUnsupported { .. })
        ));
    }
}
