use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use docrag_index::RetrievedContext;
use docrag_llm::{LlmError, LlmProvider, Message};

use crate::error::RagError;

/// Turns a query plus retrieved context into an answer from the chat model.
pub struct AnswerGenerator<P: LlmProvider> {
    provider: Arc<P>,
    timeout: Duration,
}

impl<P: LlmProvider> AnswerGenerator<P> {
    #[must_use]
    pub fn new(provider: Arc<P>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    /// # Errors
    ///
    /// Returns [`RagError::Generation`] if the model call fails, exceeds the
    /// configured timeout, or produces a blank answer.
    pub async fn generate(
        &self,
        query: &str,
        context: &RetrievedContext,
    ) -> Result<String, RagError> {
        let prompt = build_prompt(query, &context.text());
        let messages = [Message::system(prompt)];

        let answer = tokio::time::timeout(self.timeout, self.provider.chat(&messages))
            .await
            .map_err(|_| LlmError::Timeout(self.timeout))
            .and_then(|result| result)
            .map_err(|e| RagError::Generation(e.to_string()))?;

        if answer.trim().is_empty() {
            return Err(RagError::Generation(
                LlmError::EmptyResponse {
                    provider: self.provider.name(),
                }
                .to_string(),
            ));
        }

        tracing::debug!(
            provider = self.provider.name(),
            chunks = context.chunks.len(),
            answer_len = answer.len(),
            "answer generated"
        );
        Ok(answer)
    }
}

/// Wrap context and question in explicit tags so neither can bleed into the other.
#[must_use]
pub fn build_prompt(query: &str, context: &str) -> String {
    let mut prompt = String::with_capacity(query.len() + context.len() + 96);
    prompt.push_str("Given the following context, answer the question.\n");
    let _ = write!(
        prompt,
        "<context>\n{context}\n</context>\n<question>\n{query}\n</question>"
    );
    prompt
}
