//! Retrieval-augmented search: vector ranking refined by a reranking model.
//!
//! The caller supplies a pool ranked by vector similarity (twice the requested
//! size). The orchestrator asks the reranker to order the head of that pool and
//! resolves the returned identifiers back to products. Any reranking problem,
//! a reranker that overruns its time budget included, degrades to the plain
//! vector ordering; it is never surfaced as an error.

use domain_products::{Product, ProductRepository};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;
use utoipa::ToSchema;

use crate::rerank::{RerankRequest, Reranker};

pub const DEFAULT_RERANK_TIMEOUT: Duration = Duration::from_secs(10);

/// How the final ordering of a RAG search was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RerankOutcome {
    VectorOnly,
    Reranked,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RagSearchOutcome {
    pub products: Vec<Product>,
    pub outcome: RerankOutcome,
}

impl RagSearchOutcome {
    fn vector_only(mut pool: Vec<Product>, limit: usize) -> Self {
        pool.truncate(limit);
        Self {
            products: pool,
            outcome: RerankOutcome::VectorOnly,
        }
    }
}

pub struct RagOrchestrator<R: ProductRepository> {
    repository: Arc<R>,
    reranker: Option<Arc<dyn Reranker>>,
    rerank_timeout: Duration,
}

impl<R: ProductRepository> RagOrchestrator<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            reranker: None,
            rerank_timeout: DEFAULT_RERANK_TIMEOUT,
        }
    }

    pub fn with_reranker(mut self, reranker: Arc<dyn Reranker>) -> Self {
        self.reranker = Some(reranker);
        self
    }

    /// Longest a single rerank call may take before falling back
    pub fn with_rerank_timeout(mut self, timeout: Duration) -> Self {
        self.rerank_timeout = timeout;
        self
    }

    pub fn has_reranker(&self) -> bool {
        self.reranker.is_some()
    }

    /// Rerank a vector-ranked pool down to at most `limit` products
    pub async fn refine(&self, query: &str, pool: Vec<Product>, limit: usize) -> RagSearchOutcome {
        self.refine_within(query, pool, limit, self.rerank_timeout)
            .await
    }

    /// Like [`refine`](Self::refine), with the rerank call also capped by `budget`
    #[instrument(skip(self, pool), fields(pool_size = pool.len()))]
    pub async fn refine_within(
        &self,
        query: &str,
        pool: Vec<Product>,
        limit: usize,
        budget: Duration,
    ) -> RagSearchOutcome {
        let Some(reranker) = &self.reranker else {
            return RagSearchOutcome::vector_only(pool, limit);
        };

        if pool.is_empty() {
            return RagSearchOutcome::vector_only(pool, limit);
        }

        let request = RerankRequest::new(query, &pool, limit);
        let timeout = budget.min(self.rerank_timeout);
        let ids = match tokio::time::timeout(timeout, reranker.rerank(&request)).await {
            Ok(Ok(ids)) => ids,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Rerank failed, using vector order");
                return RagSearchOutcome::vector_only(pool, limit);
            }
            Err(_) => {
                tracing::warn!(?timeout, "Rerank timed out, using vector order");
                return RagSearchOutcome::vector_only(pool, limit);
            }
        };

        let products = self.resolve(&ids, limit).await;
        if products.is_empty() {
            tracing::warn!(
                returned = ids.len(),
                "Rerank resolved no products, using vector order"
            );
            return RagSearchOutcome::vector_only(pool, limit);
        }

        RagSearchOutcome {
            products,
            outcome: RerankOutcome::Reranked,
        }
    }

    /// Map returned identifiers to products, dropping unknown and repeated ones
    async fn resolve(&self, ids: &[String], limit: usize) -> Vec<Product> {
        let mut seen = HashSet::new();
        let mut products = Vec::with_capacity(limit.min(ids.len()));

        for pid in ids {
            if products.len() >= limit {
                break;
            }

            match self.repository.get_by_pid(pid).await {
                Ok(Some(product)) => {
                    if seen.insert(product.id) {
                        products.push(product);
                    }
                }
                Ok(None) => tracing::debug!(pid = %pid, "Reranked product not found"),
                Err(e) => tracing::warn!(pid = %pid, error = %e, "Failed to resolve reranked product"),
            }
        }

        products
    }
}
