//! In-memory product catalog
//!
//! Backs local development, the search API binary and tests. Listing order is
//! stable (creation time, then ID) so paging through the catalog is resumable.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ProductError, ProductResult};
use crate::models::{NewProduct, Pagination, Product, ProductFilter, ProductPage};
use crate::repository::ProductRepository;

#[derive(Debug, Default, Clone)]
pub struct InMemoryProductRepository {
    products: Arc<RwLock<HashMap<Uuid, Product>>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a product, rejecting invalid input and duplicate PIDs
    pub async fn insert(&self, input: NewProduct) -> ProductResult<Product> {
        input.validate()?;
        self.insert_product(Product::new(input)).await
    }

    /// Register a fully built product (fixtures and seeding keep their own IDs)
    pub async fn insert_product(&self, product: Product) -> ProductResult<Product> {
        let mut products = self.products.write().await;

        if products.values().any(|p| p.pid == product.pid) {
            return Err(ProductError::DuplicatePid(product.pid));
        }

        products.insert(product.id, product.clone());

        tracing::debug!(product_id = %product.id, pid = %product.pid, "Inserted product");
        Ok(product)
    }

    /// Load a JSON array of `NewProduct` records
    pub async fn seed_from_file(&self, path: impl AsRef<Path>) -> ProductResult<usize> {
        let raw = tokio::fs::read_to_string(path.as_ref()).await?;
        let records: Vec<NewProduct> = serde_json::from_str(&raw)?;

        let mut inserted = 0;
        for record in records {
            self.insert(record).await?;
            inserted += 1;
        }

        tracing::info!(
            path = %path.as_ref().display(),
            inserted,
            "Seeded product catalog"
        );
        Ok(inserted)
    }

    pub async fn len(&self) -> usize {
        self.products.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.products.read().await.is_empty()
    }

    fn sorted(products: &HashMap<Uuid, Product>, filter: &ProductFilter) -> Vec<Product> {
        let mut result: Vec<Product> = products
            .values()
            .filter(|p| p.matches(filter))
            .cloned()
            .collect();

        result.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        result
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn list_products(
        &self,
        filter: ProductFilter,
        page: Pagination,
    ) -> ProductResult<ProductPage> {
        let products = self.products.read().await;
        let matching = Self::sorted(&products, &filter);
        let total = matching.len() as u64;

        let items = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.page_size as usize)
            .collect();

        Ok(ProductPage { items, total })
    }

    async fn get_by_id(&self, id: Uuid) -> ProductResult<Option<Product>> {
        let products = self.products.read().await;
        Ok(products.get(&id).cloned())
    }

    async fn get_by_pid(&self, pid: &str) -> ProductResult<Option<Product>> {
        let products = self.products.read().await;
        Ok(products.values().find(|p| p.pid == pid).cloned())
    }

    async fn update_embedding(&self, id: Uuid, embedding: Vec<f32>) -> ProductResult<()> {
        if embedding.is_empty() {
            return Err(ProductError::Validation(
                "embedding must not be empty".to_string(),
            ));
        }

        let mut products = self.products.write().await;
        let product = products.get_mut(&id).ok_or(ProductError::NotFound(id))?;
        product.embedding = Some(embedding);
        product.updated_at = Utc::now();

        Ok(())
    }

    async fn batch_update_embeddings(
        &self,
        embeddings: HashMap<Uuid, Vec<f32>>,
    ) -> ProductResult<()> {
        let mut products = self.products.write().await;

        // Validate the whole batch before touching any record
        for (id, embedding) in &embeddings {
            if !products.contains_key(id) {
                return Err(ProductError::NotFound(*id));
            }
            if embedding.is_empty() {
                return Err(ProductError::Validation(format!(
                    "embedding for {} must not be empty",
                    id
                )));
            }
        }

        let now = Utc::now();
        let count = embeddings.len();
        for (id, embedding) in embeddings {
            if let Some(product) = products.get_mut(&id) {
                product.embedding = Some(embedding);
                product.updated_at = now;
            }
        }

        tracing::debug!(count, "Batch updated embeddings");
        Ok(())
    }

    async fn products_without_embeddings(&self, limit: u64) -> ProductResult<Vec<Product>> {
        let products = self.products.read().await;
        let filter = ProductFilter {
            has_embedding: Some(false),
            ..Default::default()
        };

        Ok(Self::sorted(&products, &filter)
            .into_iter()
            .take(limit as usize)
            .collect())
    }
}
