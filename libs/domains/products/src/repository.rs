use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::ProductResult;
use crate::models::{Pagination, Product, ProductFilter, ProductPage};

/// Repository trait for the product catalog
///
/// The semantic search core only reads through this trait and writes embeddings.
/// Implementations must apply filters themselves so callers never rescan the catalog.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// List products matching a filter, one page at a time
    async fn list_products(
        &self,
        filter: ProductFilter,
        page: Pagination,
    ) -> ProductResult<ProductPage>;

    /// Get a product by ID
    async fn get_by_id(&self, id: Uuid) -> ProductResult<Option<Product>>;

    /// Get a product by its external catalog identifier
    async fn get_by_pid(&self, pid: &str) -> ProductResult<Option<Product>>;

    /// Replace the embedding of a single product
    async fn update_embedding(&self, id: Uuid, embedding: Vec<f32>) -> ProductResult<()>;

    /// Replace the embeddings of several products in one write
    async fn batch_update_embeddings(
        &self,
        embeddings: HashMap<Uuid, Vec<f32>>,
    ) -> ProductResult<()>;

    /// Products that do not carry an embedding yet
    async fn products_without_embeddings(&self, limit: u64) -> ProductResult<Vec<Product>>;
}
