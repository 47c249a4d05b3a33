//! Search Domain
//!
//! Semantic product search over the catalog: free-text queries are embedded,
//! compared against stored product embeddings by cosine similarity, and
//! optionally reranked by a chat model (RAG search). Also keeps product
//! embeddings up to date through single-product generation and batch backfills.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │   Handlers   │  ← HTTP endpoints (axum) + OpenAPI
//! └──────┬───────┘
//!        │
//! ┌──────▼──────────────────┐
//! │  SemanticSearchService  │  ← capability check, validation, deadlines
//! └──┬──────┬──────┬─────┬──┘
//!    │      │      │     │
//!    │      │      │  ┌──▼──────────┐
//!    │      │      │  │ BackfillJob │  ← single-flight, cancellable
//!    │      │      │  └─────────────┘
//!    │      │   ┌──▼──────────────┐
//!    │      │   │ RagOrchestrator │ ← Reranker (chat model), vector fallback
//!    │      │   └─────────────────┘
//!    │   ┌──▼───────────────┐
//!    │   │ SimilarityRanker │ ← cosine similarity, floor, stable order
//!    │   └──────────────────┘
//! ┌──▼──────────────┐   ┌─────────────────┐
//! │ EmbeddingClient │ → │ OpenAIProvider  │
//! └─────────────────┘   └─────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use core_config::FromEnv;
//! use domain_products::InMemoryProductRepository;
//! use domain_search::{SearchConfig, SearchRequest, SemanticSearchService};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SearchConfig::from_env()?;
//! let service = SemanticSearchService::from_config(InMemoryProductRepository::new(), &config)?;
//!
//! let results = service.search(SearchRequest::new("waterproof hiking boots", 10)).await?;
//! for hit in results {
//!     println!("{:.3} {}", hit.score, hit.product.title);
//! }
//! # Ok(())
//! # }
//! ```

pub mod backfill;
pub mod candidates;
pub mod config;
pub mod context;
pub mod embedding;
pub mod error;
pub mod handlers;
pub mod models;
pub mod providers;
pub mod rag;
pub mod ranker;
pub mod rerank;
pub mod service;
pub mod similarity;

// Re-export commonly used types
pub use backfill::{BackfillJob, BackfillMode, BackfillReport};
pub use candidates::{CandidateQuery, CandidateSource, PriceRange, RepositoryCandidateSource};
pub use config::SearchConfig;
pub use embedding::{EmbeddingClient, ProviderCapability};
pub use error::{ErrorResponse, SearchError, SearchResult};
pub use handlers::{ApiDoc, router};
pub use models::{
    BackfillRequest, BackfillStarted, BackfillStatus, EmbeddingStats, ProductEmbeddingResponse,
    ProductHit, RagSearchRequest, RagSearchResponse, SearchRequest, SearchResponse,
};
pub use providers::{
    ChatCompletionProvider, ChatMessage, ChatRequest, ChatRole, EmbeddingProvider, OpenAIConfig,
    OpenAIProvider,
};
pub use rag::{RagOrchestrator, RagSearchOutcome, RerankOutcome};
pub use ranker::{ScoredCandidate, SimilarityRanker};
pub use rerank::{LlmReranker, RerankRequest, Reranker};
pub use service::SemanticSearchService;
pub use similarity::cosine_similarity;
