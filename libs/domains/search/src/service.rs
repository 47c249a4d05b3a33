//! Semantic search service - the entry point for search, RAG search and embedding upkeep

use domain_products::{Pagination, ProductFilter, ProductRepository};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::backfill::{BackfillJob, BackfillMode, BackfillReport};
use crate::candidates::{CandidateQuery, CandidateSource, RepositoryCandidateSource};
use crate::config::SearchConfig;
use crate::embedding::{EmbeddingClient, ProviderCapability};
use crate::error::{SearchError, SearchResult};
use crate::models::{
    BackfillRequest, BackfillStarted, BackfillStatus, EmbeddingStats, ProductEmbeddingResponse,
    RagSearchRequest, SearchRequest,
};
use crate::providers::OpenAIProvider;
use crate::rag::{RagOrchestrator, RagSearchOutcome};
use crate::ranker::{ScoredCandidate, SimilarityRanker, validate_limit};
use crate::rerank::{LlmReranker, Reranker};

/// Semantic product search over a product repository
///
/// Every embedding dependent operation checks the provider capability first
/// and fails with `EmbeddingsDisabled` when no provider is configured.
pub struct SemanticSearchService<R: ProductRepository> {
    repository: Arc<R>,
    embeddings: Arc<EmbeddingClient>,
    candidates: Arc<dyn CandidateSource>,
    ranker: SimilarityRanker,
    rag: RagOrchestrator<R>,
    backfill: Arc<BackfillJob<R>>,
    default_batch_size: u64,
    request_timeout: Duration,
    shutdown: CancellationToken,
}

impl<R: ProductRepository + 'static> SemanticSearchService<R> {
    /// Create a service around an explicit embedding client
    pub fn new(repository: R, embeddings: EmbeddingClient, config: &SearchConfig) -> Self {
        let repository = Arc::new(repository);
        let embeddings = Arc::new(embeddings);

        let candidates = RepositoryCandidateSource::new(Arc::clone(&repository))
            .with_cap(config.candidate_cap);

        Self {
            candidates: Arc::new(candidates),
            ranker: SimilarityRanker::new(config.similarity_floor),
            rag: RagOrchestrator::new(Arc::clone(&repository))
                .with_rerank_timeout(config.rerank_timeout),
            backfill: Arc::new(BackfillJob::new(
                Arc::clone(&repository),
                Arc::clone(&embeddings),
                config.backfill_delay,
            )),
            repository,
            embeddings,
            default_batch_size: config.backfill_batch_size,
            request_timeout: config.request_timeout,
            shutdown: CancellationToken::new(),
        }
    }

    /// Create a service wired to the OpenAI provider when one is configured
    pub fn from_config(repository: R, config: &SearchConfig) -> SearchResult<Self> {
        let Some(openai) = &config.openai else {
            tracing::warn!("OPENAI_API_KEY is not set, semantic search is disabled");
            let embeddings = EmbeddingClient::new(ProviderCapability::Disabled, config.max_input_chars);
            return Ok(Self::new(repository, embeddings, config));
        };

        let provider = Arc::new(OpenAIProvider::new(openai.clone())?);
        let embeddings = EmbeddingClient::new(
            ProviderCapability::Enabled(provider.clone()),
            config.max_input_chars,
        );
        let service = Self::new(repository, embeddings, config);

        tracing::info!(
            embedding_model = %openai.embedding_model,
            chat_model = %openai.chat_model,
            rerank = config.rerank_enabled,
            "Semantic search enabled"
        );

        Ok(if config.rerank_enabled {
            service.with_reranker(Arc::new(LlmReranker::new(provider)))
        } else {
            service
        })
    }

    pub fn with_reranker(mut self, reranker: Arc<dyn Reranker>) -> Self {
        self.rag = self.rag.with_reranker(reranker);
        self
    }

    pub fn with_candidate_source(mut self, candidates: Arc<dyn CandidateSource>) -> Self {
        self.candidates = candidates;
        self
    }

    /// Token whose cancellation stops background backfills
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.embeddings.is_enabled()
    }

    fn ensure_enabled(&self) -> SearchResult<()> {
        if self.is_enabled() {
            Ok(())
        } else {
            Err(SearchError::EmbeddingsDisabled)
        }
    }

    async fn with_deadline<T>(
        &self,
        operation: impl Future<Output = SearchResult<T>>,
    ) -> SearchResult<T> {
        tokio::time::timeout(self.request_timeout, operation)
            .await
            .map_err(|_| SearchError::Timeout(self.request_timeout))?
    }

    /// Rank embedded candidates against a free-text query
    #[instrument(skip(self, request), fields(limit = request.limit))]
    pub async fn search(&self, request: SearchRequest) -> SearchResult<Vec<ScoredCandidate>> {
        self.ensure_enabled()?;
        request.validate()?;
        validate_limit(request.limit)?;

        let query = request.candidate_query();
        query.validate()?;

        self.with_deadline(self.vector_search(&request.query, &query, request.limit))
            .await
    }

    /// Vector search followed by model reranking, degrading to vector order
    ///
    /// Only the vector stage can time out. The rerank gets whatever is left of
    /// the request deadline and falls back to the vector pool when it overruns.
    #[instrument(skip(self, request), fields(limit = request.limit))]
    pub async fn rag_search(&self, request: RagSearchRequest) -> SearchResult<RagSearchOutcome> {
        self.ensure_enabled()?;
        request.validate()?;
        let limit = validate_limit(request.limit)?;
        let pool_limit = request.limit.saturating_mul(2);

        let started = Instant::now();
        let pool = self
            .with_deadline(self.vector_search(&request.prompt, &CandidateQuery::default(), pool_limit))
            .await?
            .into_iter()
            .map(|c| c.product)
            .collect();

        let budget = self.request_timeout.saturating_sub(started.elapsed());
        let outcome = self
            .rag
            .refine_within(&request.prompt, pool, limit, budget)
            .await;
        tracing::info!(
            outcome = ?outcome.outcome,
            returned = outcome.products.len(),
            "RAG search complete"
        );
        Ok(outcome)
    }

    async fn vector_search(
        &self,
        text: &str,
        query: &CandidateQuery,
        limit: i64,
    ) -> SearchResult<Vec<ScoredCandidate>> {
        let vector = self.embeddings.embed(text).await?;
        let candidates = self.candidates.candidates(query).await?;
        let scanned = candidates.len();

        let ranked = self.ranker.rank_scored(&vector, candidates, limit)?;
        tracing::info!(scanned, returned = ranked.len(), "Semantic search complete");
        Ok(ranked)
    }

    /// Run a catalog backfill to completion
    pub async fn backfill_embeddings(&self, batch_size: Option<u64>) -> SearchResult<BackfillReport> {
        self.ensure_enabled()?;
        let batch_size = batch_size.unwrap_or(self.default_batch_size);
        self.backfill
            .backfill(batch_size, &self.shutdown.child_token())
            .await
    }

    /// Embed only products that have none, round after round
    pub async fn backfill_missing_embeddings(
        &self,
        batch_size: Option<u64>,
    ) -> SearchResult<BackfillReport> {
        self.ensure_enabled()?;
        let batch_size = batch_size.unwrap_or(self.default_batch_size);
        self.backfill
            .backfill_missing(batch_size, &self.shutdown.child_token())
            .await
    }

    /// Start a backfill in the background; fails fast if one is running
    #[instrument(skip(self))]
    pub fn start_backfill(&self, request: BackfillRequest) -> SearchResult<BackfillStarted> {
        self.ensure_enabled()?;
        request.validate()?;

        let batch_size = request.batch_size.unwrap_or(self.default_batch_size);
        let mode = if request.missing_only {
            BackfillMode::MissingOnly
        } else {
            BackfillMode::Catalog
        };

        self.backfill
            .spawn(mode, batch_size, self.shutdown.child_token())?;
        tracing::info!(batch_size, ?mode, "Embedding backfill started");

        Ok(BackfillStarted {
            status: "started".to_string(),
            batch_size,
            missing_only: request.missing_only,
        })
    }

    pub async fn backfill_status(&self) -> BackfillStatus {
        BackfillStatus {
            running: self.backfill.is_running(),
            last_report: self.backfill.last_report().await,
        }
    }

    /// Generate and store the embedding of a single product
    #[instrument(skip(self))]
    pub async fn generate_product_embedding(
        &self,
        id: Uuid,
    ) -> SearchResult<ProductEmbeddingResponse> {
        self.ensure_enabled()?;

        let product = self
            .repository
            .get_by_id(id)
            .await?
            .ok_or(SearchError::ProductNotFound(id))?;

        let vector = self.embeddings.embed(&product.embedding_text()).await?;
        let dimension = vector.len();
        self.repository.update_embedding(id, vector).await?;

        tracing::info!(product_id = %id, pid = %product.pid, dimension, "Stored product embedding");
        Ok(ProductEmbeddingResponse {
            id,
            pid: product.pid,
            dimension,
        })
    }

    /// Embedding coverage of the catalog; available even when search is disabled
    #[instrument(skip(self))]
    pub async fn embedding_stats(&self) -> SearchResult<EmbeddingStats> {
        let total = self
            .repository
            .list_products(ProductFilter::default(), Pagination::first(1))
            .await?
            .total;

        let embedded_filter = ProductFilter {
            has_embedding: Some(true),
            ..Default::default()
        };
        let with_embeddings = self
            .repository
            .list_products(embedded_filter, Pagination::first(1))
            .await?
            .total;

        Ok(EmbeddingStats::new(total, with_embeddings, self.is_enabled()))
    }
}
