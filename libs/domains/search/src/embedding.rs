//! Embedding client: the single gate between search and the embedding provider.

use std::fmt;
use std::sync::Arc;
use tracing::instrument;

use crate::config::DEFAULT_MAX_INPUT_CHARS;
use crate::error::{SearchError, SearchResult};
use crate::providers::EmbeddingProvider;

/// Whether a provider is available, decided once at startup
#[derive(Clone, Default)]
pub enum ProviderCapability {
    #[default]
    Disabled,
    Enabled(Arc<dyn EmbeddingProvider>),
}

impl ProviderCapability {
    pub fn is_enabled(&self) -> bool {
        matches!(self, ProviderCapability::Enabled(_))
    }
}

impl fmt::Debug for ProviderCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderCapability::Disabled => f.write_str("Disabled"),
            ProviderCapability::Enabled(provider) => {
                write!(f, "Enabled({})", provider.model_name())
            }
        }
    }
}

/// Turns text into vectors through the configured provider
#[derive(Debug, Clone)]
pub struct EmbeddingClient {
    capability: ProviderCapability,
    max_input_chars: usize,
}

impl EmbeddingClient {
    pub fn new(capability: ProviderCapability, max_input_chars: usize) -> Self {
        Self {
            capability,
            max_input_chars: max_input_chars.max(1),
        }
    }

    pub fn with_provider(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self::new(
            ProviderCapability::Enabled(provider),
            DEFAULT_MAX_INPUT_CHARS,
        )
    }

    pub fn disabled() -> Self {
        Self::new(ProviderCapability::Disabled, DEFAULT_MAX_INPUT_CHARS)
    }

    pub fn is_enabled(&self) -> bool {
        self.capability.is_enabled()
    }

    pub fn max_input_chars(&self) -> usize {
        self.max_input_chars
    }

    /// Embed a single text.
    ///
    /// Input longer than `max_input_chars` characters is cut on a character
    /// boundary before it is sent.
    #[instrument(skip(self, text), fields(chars = text.chars().count()))]
    pub async fn embed(&self, text: &str) -> SearchResult<Vec<f32>> {
        let ProviderCapability::Enabled(provider) = &self.capability else {
            return Err(SearchError::ProviderUnavailable);
        };

        let input = truncate_input(text, self.max_input_chars);
        let vectors = provider.embed_batch(&[input.to_string()]).await?;

        match vectors.into_iter().next() {
            Some(vector) if !vector.is_empty() => {
                tracing::debug!(dimension = vector.len(), "Generated embedding");
                Ok(vector)
            }
            _ => Err(SearchError::EmbeddingEmptyResponse),
        }
    }
}

/// Longest prefix of `text` holding at most `max_chars` characters
pub fn truncate_input(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MockEmbeddingProvider;

    #[test]
    fn test_truncate_input_respects_char_boundaries() {
        assert_eq!(truncate_input("hello", 10), "hello");
        assert_eq!(truncate_input("hello", 5), "hello");
        assert_eq!(truncate_input("hello", 3), "hel");
        assert_eq!(truncate_input("héllo wörld", 4), "héll");
        assert_eq!(truncate_input("日本語テキスト", 3), "日本語");
    }

    #[tokio::test]
    async fn test_disabled_client_reports_provider_unavailable() {
        let client = EmbeddingClient::disabled();
        assert!(!client.is_enabled());

        let result = client.embed("running shoes").await;
        assert!(matches!(result, Err(SearchError::ProviderUnavailable)));
    }

    #[tokio::test]
    async fn test_embed_truncates_long_input() {
        let mut provider = MockEmbeddingProvider::new();
        provider
            .expect_embed_batch()
            .withf(|texts| texts.len() == 1 && texts[0].chars().count() == 8000)
            .times(1)
            .returning(|_| Ok(vec![vec![0.1, 0.2]]));

        let client = EmbeddingClient::with_provider(Arc::new(provider));
        let long_text = "ü".repeat(9000);

        let vector = client.embed(&long_text).await.unwrap();
        assert_eq!(vector, vec![0.1, 0.2]);
    }

    #[tokio::test]
    async fn test_empty_provider_response() {
        let mut provider = MockEmbeddingProvider::new();
        provider
            .expect_embed_batch()
            .times(2)
            .returning({
                let mut calls = 0;
                move |_| {
                    calls += 1;
                    if calls == 1 { Ok(vec![]) } else { Ok(vec![vec![]]) }
                }
            });

        let client = EmbeddingClient::with_provider(Arc::new(provider));
        assert!(matches!(
            client.embed("a").await,
            Err(SearchError::EmbeddingEmptyResponse)
        ));
        assert!(matches!(
            client.embed("b").await,
            Err(SearchError::EmbeddingEmptyResponse)
        ));
    }

    #[tokio::test]
    async fn test_provider_error_is_propagated() {
        let mut provider = MockEmbeddingProvider::new();
        provider
            .expect_embed_batch()
            .withf(|texts| texts.len() == 1 && texts[0] == "query")
            .returning(|_| Err(SearchError::EmbeddingRequestFailed("503".to_string())));

        let client = EmbeddingClient::with_provider(Arc::new(provider));
        let result = client.embed("query").await;
        assert!(matches!(result, Err(SearchError::EmbeddingRequestFailed(_))));
    }
}
