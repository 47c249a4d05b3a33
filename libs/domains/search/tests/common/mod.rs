//! Stub providers shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use domain_search::{
    ChatCompletionProvider, ChatRequest, EmbeddingProvider, SearchError, SearchResult,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

type EmbedFn = dyn Fn(&str) -> SearchResult<Vec<f32>> + Send + Sync;

/// Embedding provider driven by a closure, counting every call
pub struct StubEmbeddings {
    embed: Box<EmbedFn>,
    calls: AtomicUsize,
}

impl StubEmbeddings {
    pub fn new(embed: impl Fn(&str) -> SearchResult<Vec<f32>> + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            embed: Box::new(embed),
            calls: AtomicUsize::new(0),
        })
    }

    /// Same vector for every input
    pub fn constant(vector: Vec<f32>) -> Arc<Self> {
        Self::new(move |_| Ok(vector.clone()))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for StubEmbeddings {
    fn model_name(&self) -> String {
        "stub-embedding".to_string()
    }

    async fn embed_batch(&self, texts: &[String]) -> SearchResult<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        texts.iter().map(|t| (self.embed)(t)).collect()
    }
}

/// Chat provider replying with a fixed body, or failing
pub struct StubChat {
    reply: SearchResult<String>,
    calls: AtomicUsize,
}

impl StubChat {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: Err(SearchError::RerankFailed("model unavailable".to_string())),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatCompletionProvider for StubChat {
    async fn complete(&self, _request: ChatRequest) -> SearchResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Ok(body) => Ok(body.clone()),
            Err(e) => Err(SearchError::RerankFailed(e.to_string())),
        }
    }
}
