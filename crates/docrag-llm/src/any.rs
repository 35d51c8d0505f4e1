#[cfg(feature = "mock")]
use crate::mock::MockProvider;
use crate::ollama::OllamaProvider;

use crate::error::LlmError;
use crate::provider::{LlmProvider, Message};

/// Generates a match over all `AnyProvider` variants, binding the inner provider
/// and evaluating the given expression for each arm.
macro_rules! delegate_provider {
    ($self:expr, |$p:ident| $expr:expr) => {
        match $self {
            AnyProvider::Ollama($p) => $expr,
            #[cfg(feature = "mock")]
            AnyProvider::Mock($p) => $expr,
        }
    };
}

#[derive(Debug, Clone)]
pub enum AnyProvider {
    Ollama(OllamaProvider),
    #[cfg(feature = "mock")]
    Mock(MockProvider),
}

impl AnyProvider {
    #[must_use]
    pub fn as_ollama(&self) -> Option<&OllamaProvider> {
        match self {
            Self::Ollama(p) => Some(p),
            #[cfg(feature = "mock")]
            Self::Mock(_) => None,
        }
    }
}

impl LlmProvider for AnyProvider {
    async fn chat(&self, messages: &[Message]) -> Result<String, LlmError> {
        delegate_provider!(self, |p| p.chat(messages).await)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        delegate_provider!(self, |p| p.embed(text).await)
    }

    fn supports_embeddings(&self) -> bool {
        delegate_provider!(self, |p| p.supports_embeddings())
    }

    fn name(&self) -> &'static str {
        delegate_provider!(self, |p| p.name())
    }
}

impl From<OllamaProvider> for AnyProvider {
    fn from(provider: OllamaProvider) -> Self {
        Self::Ollama(provider)
    }
}

#[cfg(feature = "mock")]
impl From<MockProvider> for AnyProvider {
    fn from(provider: MockProvider) -> Self {
        Self::Mock(provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ollama_variant_delegates_name() {
        let any: AnyProvider =
            OllamaProvider::new("http://localhost:11434", "llama3".into(), "embed".into()).into();
        assert_eq!(any.name(), "ollama");
        assert!(any.supports_embeddings());
        assert_eq!(any.as_ollama().map(OllamaProvider::model), Some("llama3"));
    }

    #[cfg(feature = "mock")]
    #[tokio::test]
    async fn mock_variant_delegates_chat() {
        let any = AnyProvider::from(MockProvider::echoing());
        assert!(any.as_ollama().is_none());
        let reply = any.chat(&[Message::system("ping")]).await.unwrap();
        assert_eq!(reply, "ping");
    }
}
