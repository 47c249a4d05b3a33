//! Candidate retrieval: the catalog slice a search is allowed to rank.

use async_trait::async_trait;
use domain_products::{Pagination, Product, ProductFilter, ProductRepository};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;

use crate::config::DEFAULT_CANDIDATE_CAP;
use crate::error::{SearchError, SearchResult};

/// Inclusive numeric price bounds; either side may be open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PriceRange {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

impl PriceRange {
    pub fn new(min: Option<i64>, max: Option<i64>) -> Self {
        Self { min, max }
    }

    /// Reject negative bounds and inverted ranges
    pub fn validate(&self) -> SearchResult<()> {
        let negative = self.min.is_some_and(|v| v < 0) || self.max.is_some_and(|v| v < 0);
        let inverted = matches!((self.min, self.max), (Some(min), Some(max)) if min > max);

        if negative || inverted {
            return Err(SearchError::InvalidPriceRange {
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

/// Structured filters a semantic search narrows its candidates with
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateQuery {
    pub category: Option<String>,
    pub price_range: Option<PriceRange>,
    pub in_stock: Option<bool>,
}

impl CandidateQuery {
    pub fn validate(&self) -> SearchResult<()> {
        match &self.price_range {
            Some(range) => range.validate(),
            None => Ok(()),
        }
    }

    /// Repository filter for this query; only embedded products qualify
    pub fn to_filter(&self) -> ProductFilter {
        let range = self.price_range.unwrap_or_default();
        ProductFilter {
            category: self.category.clone().filter(|c| !c.trim().is_empty()),
            min_price: range.min,
            max_price: range.max,
            in_stock: self.in_stock,
            has_embedding: Some(true),
            ..Default::default()
        }
    }
}

/// Source of embedded products for ranking
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CandidateSource: Send + Sync {
    async fn candidates(&self, query: &CandidateQuery) -> SearchResult<Vec<Product>>;
}

/// Reads candidates straight from the product repository
pub struct RepositoryCandidateSource<R: ProductRepository> {
    repository: Arc<R>,
    cap: u64,
}

impl<R: ProductRepository> RepositoryCandidateSource<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            cap: DEFAULT_CANDIDATE_CAP,
        }
    }

    pub fn with_cap(mut self, cap: u64) -> Self {
        self.cap = cap.max(1);
        self
    }
}

#[async_trait]
impl<R: ProductRepository> CandidateSource for RepositoryCandidateSource<R> {
    #[instrument(skip(self), fields(cap = self.cap))]
    async fn candidates(&self, query: &CandidateQuery) -> SearchResult<Vec<Product>> {
        query.validate()?;

        let page = self
            .repository
            .list_products(query.to_filter(), Pagination::first(self.cap))
            .await?;

        if page.total > self.cap {
            tracing::debug!(
                total = page.total,
                "Candidate set truncated to the configured cap"
            );
        }

        Ok(page.items)
    }
}
