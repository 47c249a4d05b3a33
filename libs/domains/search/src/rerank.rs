//! Language-model reranking of a vector-ranked candidate pool.

use async_trait::async_trait;
use domain_products::Product;
use std::sync::Arc;
use tracing::instrument;

use crate::context::{MAX_CONTEXT_PRODUCTS, summarize};
use crate::error::{SearchError, SearchResult};
use crate::providers::{ChatCompletionProvider, ChatMessage, ChatRequest};

pub const RERANK_SYSTEM_PROMPT: &str = "You are a product search assistant. Given a user query and a list of products, \
select the products that best match the query and order them from most to least relevant. \
Respond with a JSON array of product PIDs only, for example [\"PID1\", \"PID2\"]. \
Do not include any other text.";

pub const RERANK_TEMPERATURE: f32 = 0.3;
pub const RERANK_MAX_TOKENS: u32 = 500;

/// What the reranking model is asked to order
#[derive(Debug, Clone, PartialEq)]
pub struct RerankRequest {
    pub query: String,
    /// PIDs of the summarized candidates, in vector-rank order
    pub candidate_pids: Vec<String>,
    /// Product summaries built from the same candidates
    pub context: String,
    pub limit: usize,
}

impl RerankRequest {
    /// Build a request from the head of a vector-ranked pool
    pub fn new(query: impl Into<String>, pool: &[Product], limit: usize) -> Self {
        let head = &pool[..pool.len().min(MAX_CONTEXT_PRODUCTS)];
        Self {
            query: query.into(),
            candidate_pids: head.iter().map(|p| p.pid.clone()).collect(),
            context: summarize(head),
            limit,
        }
    }

    fn user_message(&self) -> String {
        format!(
            "User query: {}\n\nAvailable products:\n{}\n\nReturn top {} relevant product PIDs:",
            self.query, self.context, self.limit
        )
    }
}

/// Orders candidates by relevance to a query
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Reranker: Send + Sync {
    /// Ordered product identifiers, most relevant first
    async fn rerank(&self, request: &RerankRequest) -> SearchResult<Vec<String>>;
}

/// Reranker backed by a chat completion model
pub struct LlmReranker {
    provider: Arc<dyn ChatCompletionProvider>,
    temperature: f32,
    max_tokens: u32,
}

impl LlmReranker {
    pub fn new(provider: Arc<dyn ChatCompletionProvider>) -> Self {
        Self {
            provider,
            temperature: RERANK_TEMPERATURE,
            max_tokens: RERANK_MAX_TOKENS,
        }
    }
}

#[async_trait]
impl Reranker for LlmReranker {
    #[instrument(skip(self, request), fields(candidates = request.candidate_pids.len(), limit = request.limit))]
    async fn rerank(&self, request: &RerankRequest) -> SearchResult<Vec<String>> {
        let chat = ChatRequest {
            messages: vec![
                ChatMessage::system(RERANK_SYSTEM_PROMPT),
                ChatMessage::user(request.user_message()),
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let content = self.provider.complete(chat).await.map_err(|e| match e {
            SearchError::RerankFailed(msg) => SearchError::RerankFailed(msg),
            other => SearchError::RerankFailed(other.to_string()),
        })?;

        parse_ranked_ids(&content)
    }
}

/// Parse a model reply that must be exactly a JSON array of strings
pub fn parse_ranked_ids(content: &str) -> SearchResult<Vec<String>> {
    serde_json::from_str::<Vec<String>>(content.trim())
        .map_err(|e| SearchError::RerankFailed(format!("unparseable rerank reply: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MockChatCompletionProvider;
    use domain_products::NewProduct;

    fn pool(n: usize) -> Vec<Product> {
        (0..n)
            .map(|i| {
                Product::new(NewProduct {
                    pid: format!("P{}", i),
                    title: format!("Product {}", i),
                    ..Default::default()
                })
            })
            .collect()
    }

    #[test]
    fn test_parse_ranked_ids() {
        assert_eq!(
            parse_ranked_ids(" [\"P2\", \"P1\"]\n").unwrap(),
            vec!["P2".to_string(), "P1".to_string()]
        );
        assert!(parse_ranked_ids("[]").unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_non_array_replies() {
        for reply in [
            "Here are the products: [\"P1\"]",
            "```json\n[\"P1\"]\n```",
            "{\"pids\": [\"P1\"]}",
            "[1, 2]",
            "",
        ] {
            assert!(
                matches!(parse_ranked_ids(reply), Err(SearchError::RerankFailed(_))),
                "reply {:?} should not parse",
                reply
            );
        }
    }

    #[test]
    fn test_request_uses_at_most_five_candidates() {
        let request = RerankRequest::new("trail shoes", &pool(9), 4);
        assert_eq!(request.candidate_pids, vec!["P0", "P1", "P2", "P3", "P4"]);
        assert!(request.user_message().starts_with("User query: trail shoes\n\nAvailable products:\n"));
        assert!(request.user_message().ends_with("Return top 4 relevant product PIDs:"));
    }

    #[tokio::test]
    async fn test_llm_reranker_sends_prompt_and_parses_reply() {
        let mut provider = MockChatCompletionProvider::new();
        provider
            .expect_complete()
            .withf(|req| {
                req.messages.len() == 2
                    && req.messages[0].content == RERANK_SYSTEM_PROMPT
                    && req.messages[1].content.contains("PID: P1")
                    && req.temperature == RERANK_TEMPERATURE
                    && req.max_tokens == RERANK_MAX_TOKENS
            })
            .times(1)
            .returning(|_| Ok("[\"P1\", \"P0\"]".to_string()));

        let reranker = LlmReranker::new(Arc::new(provider));
        let ids = reranker
            .rerank(&RerankRequest::new("q", &pool(2), 2))
            .await
            .unwrap();
        assert_eq!(ids, vec!["P1", "P0"]);
    }

    #[tokio::test]
    async fn test_provider_failure_becomes_rerank_failed() {
        let mut provider = MockChatCompletionProvider::new();
        provider
            .expect_complete()
            .returning(|_| Err(SearchError::EmbeddingRequestFailed("timeout".to_string())));

        let reranker = LlmReranker::new(Arc::new(provider));
        let result = reranker.rerank(&RerankRequest::new("q", &pool(1), 1)).await;
        assert!(matches!(result, Err(SearchError::RerankFailed(_))));
    }
}
