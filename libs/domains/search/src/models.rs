use domain_products::Product;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::backfill::BackfillReport;
use crate::candidates::{CandidateQuery, PriceRange};
use crate::rag::{RagSearchOutcome, RerankOutcome};
use crate::ranker::ScoredCandidate;

fn default_limit() -> i64 {
    10
}

/// Semantic search query parameters
#[derive(Debug, Clone, Deserialize, Validate, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchRequest {
    /// Free-text query
    #[validate(length(min = 1, max = 2000, message = "query must be 1-2000 characters"))]
    pub query: String,
    /// Maximum number of results
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Exact category match
    pub category: Option<String>,
    /// Minimum numeric price (inclusive)
    pub min_price: Option<i64>,
    /// Maximum numeric price (inclusive)
    pub max_price: Option<i64>,
    /// Restrict to products that are in stock
    pub in_stock: Option<bool>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, limit: i64) -> Self {
        Self {
            query: query.into(),
            limit,
            category: None,
            min_price: None,
            max_price: None,
            in_stock: None,
        }
    }

    pub fn candidate_query(&self) -> CandidateQuery {
        let range = PriceRange::new(self.min_price, self.max_price);
        CandidateQuery {
            category: self.category.clone(),
            price_range: (!range.is_unbounded()).then_some(range),
            in_stock: self.in_stock,
        }
    }
}

/// Retrieval-augmented search request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RagSearchRequest {
    /// Natural language description of what the user wants
    #[validate(length(min = 1, max = 2000, message = "prompt must be 1-2000 characters"))]
    pub prompt: String,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

/// Embedding backfill trigger
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct BackfillRequest {
    /// Products per page; defaults to the configured batch size
    #[validate(range(min = 1, max = 1000))]
    pub batch_size: Option<u64>,
    /// Only fetch products without embeddings instead of scanning the catalog
    #[serde(default)]
    pub missing_only: bool,
}

/// A product in a search response, without its embedding
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductHit {
    #[serde(flatten)]
    pub product: Product,
    /// Cosine similarity to the query, when ranked by vector
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl ProductHit {
    pub fn new(mut product: Product, score: Option<f32>) -> Self {
        product.embedding = None;
        Self { product, score }
    }
}

impl From<ScoredCandidate> for ProductHit {
    fn from(candidate: ScoredCandidate) -> Self {
        Self::new(candidate.product, Some(candidate.score))
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SearchResponse {
    pub results: Vec<ProductHit>,
    pub count: usize,
}

impl From<Vec<ScoredCandidate>> for SearchResponse {
    fn from(scored: Vec<ScoredCandidate>) -> Self {
        let results: Vec<ProductHit> = scored.into_iter().map(ProductHit::from).collect();
        Self {
            count: results.len(),
            results,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RagSearchResponse {
    pub results: Vec<ProductHit>,
    pub count: usize,
    pub outcome: RerankOutcome,
}

impl From<RagSearchOutcome> for RagSearchResponse {
    fn from(outcome: RagSearchOutcome) -> Self {
        let results: Vec<ProductHit> = outcome
            .products
            .into_iter()
            .map(|p| ProductHit::new(p, None))
            .collect();
        Self {
            count: results.len(),
            results,
            outcome: outcome.outcome,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BackfillStarted {
    pub status: String,
    pub batch_size: u64,
    pub missing_only: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BackfillStatus {
    pub running: bool,
    /// Counters of the most recent finished run
    pub last_report: Option<BackfillReport>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductEmbeddingResponse {
    pub id: Uuid,
    pub pid: String,
    pub dimension: usize,
}

/// Embedding coverage of the catalog
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct EmbeddingStats {
    pub total_products: u64,
    pub with_embeddings: u64,
    pub without_embeddings: u64,
    /// Fraction of products with an embedding, 0.0 for an empty catalog
    pub coverage: f64,
    pub embeddings_enabled: bool,
}

impl EmbeddingStats {
    pub fn new(total_products: u64, with_embeddings: u64, embeddings_enabled: bool) -> Self {
        let coverage = if total_products == 0 {
            0.0
        } else {
            with_embeddings as f64 / total_products as f64
        };
        Self {
            total_products,
            with_embeddings,
            without_embeddings: total_products.saturating_sub(with_embeddings),
            coverage,
            embeddings_enabled,
        }
    }
}
