//! Test-only mock provider with deterministic embeddings.

use std::sync::{Arc, Mutex, PoisonError};

use crate::error::LlmError;
use crate::provider::{LlmProvider, Message};

#[derive(Debug, Clone)]
pub struct MockProvider {
    responses: Arc<Mutex<Vec<String>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    pub default_response: String,
    /// Length of the hashed bag-of-words vectors returned by `embed`.
    pub embedding_dims: usize,
    pub supports_embeddings: bool,
    /// Reply with the content of the last message instead of a canned response.
    pub echo: bool,
    pub fail_chat: bool,
    pub fail_embed: bool,
    /// Milliseconds to sleep before answering a chat request.
    pub delay_ms: u64,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
            default_response: "mock response".into(),
            embedding_dims: 64,
            supports_embeddings: true,
            echo: false,
            fail_chat: false,
            fail_embed: false,
            delay_ms: 0,
        }
    }
}

impl MockProvider {
    #[must_use]
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn echoing() -> Self {
        Self {
            echo: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail_chat: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failing_embed() -> Self {
        Self {
            fail_embed: true,
            ..Self::default()
        }
    }

    /// Chat-only provider: `embed` fails and `supports_embeddings` is false.
    #[must_use]
    pub fn without_embeddings() -> Self {
        Self {
            supports_embeddings: false,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_embedding_dims(mut self, dims: usize) -> Self {
        self.embedding_dims = dims;
        self
    }

    #[must_use]
    pub fn with_delay(mut self, ms: u64) -> Self {
        self.delay_ms = ms;
        self
    }

    /// Prompts received by `chat`, oldest first. Shared between clones.
    #[must_use]
    pub fn recorded_prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl LlmProvider for MockProvider {
    async fn chat(&self, messages: &[Message]) -> Result<String, LlmError> {
        if self.delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
        }
        let last = messages.last().map(|m| m.content.clone()).unwrap_or_default();
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(last.clone());

        if self.fail_chat {
            return Err(LlmError::Other("mock LLM error".into()));
        }
        if self.echo {
            return Ok(last);
        }
        let mut responses = self.responses.lock().unwrap_or_else(PoisonError::into_inner);
        if responses.is_empty() {
            Ok(self.default_response.clone())
        } else {
            Ok(responses.remove(0))
        }
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        if !self.supports_embeddings {
            return Err(LlmError::EmbedUnsupported { provider: "mock" });
        }
        if self.fail_embed {
            return Err(LlmError::Other("mock embed error".into()));
        }
        Ok(hashed_embedding(text, self.embedding_dims))
    }

    fn supports_embeddings(&self) -> bool {
        self.supports_embeddings
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Bag-of-words vector: each lowercased word bumps one blake3-selected bucket.
fn hashed_embedding(text: &str, dims: usize) -> Vec<f32> {
    let mut vector = vec![0.0f32; dims];
    if dims == 0 {
        return vector;
    }
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let hash = blake3::hash(word.to_lowercase().as_bytes());
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&hash.as_bytes()[..8]);
        #[expect(clippy::cast_possible_truncation)]
        let bucket = (u64::from_le_bytes(prefix) % dims as u64) as usize;
        vector[bucket] += 1.0;
    }
    vector
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashed_embedding_is_deterministic_and_case_insensitive() {
        let a = hashed_embedding("The Sky is Blue", 32);
        let b = hashed_embedding("the sky is blue", 32);
        assert_eq!(a, b);
        assert!((a.iter().sum::<f32>() - 4.0).abs() < f32::EPSILON);
    }

    #[test]
    fn hashed_embedding_zero_dims() {
        assert!(hashed_embedding("anything", 0).is_empty());
    }

    #[tokio::test]
    async fn echo_returns_last_message() {
        let mock = MockProvider::echoing();
        let reply = mock
            .chat(&[Message::system("first"), Message::user("second")])
            .await
            .unwrap();
        assert_eq!(reply, "second");
        assert_eq!(mock.recorded_prompts(), vec!["second".to_owned()]);
    }

    #[tokio::test]
    async fn queued_responses_then_default() {
        let mock = MockProvider::with_responses(vec!["one".into()]);
        let msgs = [Message::user("q")];
        assert_eq!(mock.chat(&msgs).await.unwrap(), "one");
        assert_eq!(mock.chat(&msgs).await.unwrap(), "mock response");
    }

    #[tokio::test]
    async fn failing_chat_errors() {
        let mock = MockProvider::failing();
        assert!(mock.chat(&[Message::user("q")]).await.is_err());
    }

    #[tokio::test]
    async fn embed_unsupported() {
        let mock = MockProvider::without_embeddings();
        assert!(!mock.supports_embeddings());
        let err = mock.embed("x").await.unwrap_err();
        assert!(matches!(err, LlmError::EmbedUnsupported { provider: "mock" }));
    }

    #[tokio::test]
    async fn embedding_switches() {
        let narrow = MockProvider::default().with_embedding_dims(8);
        assert_eq!(narrow.embed("the sky").await.unwrap().len(), 8);

        let broken = MockProvider::failing_embed();
        assert!(broken.supports_embeddings());
        assert!(broken.embed("x").await.is_err());
    }

    #[tokio::test]
    async fn clones_share_recorded_prompts() {
        let mock = MockProvider::default();
        let clone = mock.clone();
        clone.chat(&[Message::user("shared")]).await.unwrap();
        assert_eq!(mock.recorded_prompts(), vec!["shared".to_owned()]);
    }
}
