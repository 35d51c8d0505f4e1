use std::sync::Arc;
use std::time::Duration;

use docrag_llm::{LlmError, LlmProvider};

use crate::document::Document;
use crate::error::IndexError;
use crate::index::{IndexEntry, VectorIndex};
use crate::splitter::TextSplitter;

/// Splits documents and embeds every chunk into a fresh [`VectorIndex`].
pub struct IndexBuilder<P: LlmProvider> {
    provider: Arc<P>,
    splitter: TextSplitter,
    embedding_model: String,
    embed_timeout: Duration,
}

impl<P: LlmProvider> IndexBuilder<P> {
    #[must_use]
    pub fn new(
        provider: Arc<P>,
        splitter: TextSplitter,
        embedding_model: impl Into<String>,
        embed_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            splitter,
            embedding_model: embedding_model.into(),
            embed_timeout,
        }
    }

    /// Build an index over `documents`. An empty slice yields an empty index.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot embed, if any embedding call
    /// fails or times out, or if a vector's length differs from the others.
    pub async fn build(&self, documents: &[Document]) -> Result<VectorIndex, IndexError> {
        ensure_embeddings(&*self.provider)?;
        let mut index = VectorIndex::empty(self.embedding_model.clone());

        for document in documents {
            let chunks = self.splitter.split(document);
            tracing::debug!(
                source = %document.metadata.source,
                chunks = chunks.len(),
                "embedding document"
            );
            for chunk in &chunks {
                let vector =
                    embed_with_timeout(&*self.provider, &chunk.content, self.embed_timeout).await?;
                index.insert(IndexEntry::from_chunk(chunk, vector))?;
            }
        }

        tracing::info!(
            documents = documents.len(),
            chunks = index.len(),
            dimensions = index.dimensions,
            "index built"
        );
        Ok(index)
    }
}

pub(crate) fn ensure_embeddings<P: LlmProvider>(provider: &P) -> Result<(), IndexError> {
    if provider.supports_embeddings() {
        Ok(())
    } else {
        Err(IndexError::Embedding(LlmError::EmbedUnsupported {
            provider: provider.name(),
        }))
    }
}

pub(crate) async fn embed_with_timeout<P: LlmProvider>(
    provider: &P,
    text: &str,
    timeout: Duration,
) -> Result<Vec<f32>, IndexError> {
    match tokio::time::timeout(timeout, provider.embed(text)).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(IndexError::Embedding(LlmError::Timeout(timeout))),
    }
}
