use async_trait::async_trait;

use crate::error::SearchResult;

/// Trait for text embedding providers
///
/// Implementations return one vector per input text, in input order. An empty
/// result is passed through untouched; the embedding client decides what it means.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Model identifier sent with every request
    fn model_name(&self) -> String;

    /// Generate embeddings for several texts in one request
    async fn embed_batch(&self, texts: &[String]) -> SearchResult<Vec<Vec<f32>>>;
}
