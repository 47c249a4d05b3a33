use async_trait::async_trait;
use core_config::{ConfigError, env_optional, env_or_default, env_parse_or};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ChatCompletionProvider, ChatMessage, ChatRequest, EmbeddingProvider};
use crate::error::{SearchError, SearchResult};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";

/// OpenAI (or API compatible) provider configuration
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub base_url: String,
    pub embedding_model: String,
    pub chat_model: String,
    pub request_timeout: Duration,
}

impl OpenAIConfig {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Load from the environment.
    ///
    /// Returns `Ok(None)` when `OPENAI_API_KEY` is unset or blank, which
    /// switches semantic search off rather than failing startup.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(api_key) = env_optional("OPENAI_API_KEY") else {
            return Ok(None);
        };

        let timeout_secs = env_parse_or("SEARCH_REQUEST_TIMEOUT_SECS", 30u64)?;

        Ok(Some(Self {
            api_key,
            base_url: env_or_default("OPENAI_BASE_URL", DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            embedding_model: env_or_default("EMBEDDING_MODEL", DEFAULT_EMBEDDING_MODEL),
            chat_model: env_or_default("CHAT_MODEL", DEFAULT_CHAT_MODEL),
            request_timeout: Duration::from_secs(timeout_secs),
        }))
    }
}

/// Embeddings and chat completions over the OpenAI REST API
pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    pub fn new(config: OpenAIConfig) -> SearchResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| SearchError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> reqwest::Result<reqwest::Response> {
        self.client
            .post(format!("{}/{}", self.config.base_url, path))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

impl EmbeddingResponse {
    fn into_vectors(self) -> Vec<Vec<f32>> {
        let mut data = self.data;
        data.sort_by_key(|d| d.index);
        data.into_iter().map(|d| d.embedding).collect()
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl EmbeddingProvider for OpenAIProvider {
    fn model_name(&self) -> String {
        self.config.embedding_model.clone()
    }

    async fn embed_batch(&self, texts: &[String]) -> SearchResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let request = EmbeddingRequest {
            model: &self.config.embedding_model,
            input: texts,
        };

        let response = self.post("embeddings", &request).await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(SearchError::EmbeddingRequestFailed(format!(
                "OpenAI API error ({}): {}",
                status, error_text
            )));
        }

        let body: EmbeddingResponse = response.json().await?;
        Ok(body.into_vectors())
    }
}

#[async_trait]
impl ChatCompletionProvider for OpenAIProvider {
    async fn complete(&self, request: ChatRequest) -> SearchResult<String> {
        let body = ChatCompletionRequest {
            model: &self.config.chat_model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .post("chat/completions", &body)
            .await
            .map_err(|e| SearchError::RerankFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(SearchError::RerankFailed(format!(
                "OpenAI API error ({}): {}",
                status, error_text
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| SearchError::RerankFailed(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| SearchError::RerankFailed("no completion choices returned".to_string()))
    }
}
