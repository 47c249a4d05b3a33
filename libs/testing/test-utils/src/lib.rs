//! Shared test utilities for domain testing
//!
//! - `TestDataBuilder`: deterministic identifiers seeded from the test name
//! - `ProductBuilder`: catalog fixtures with stable discovery order
//! - `vectors`: small embedding helpers
//! - `assertions`: custom assertion helpers
//!
//! # Usage
//!
//! ```rust
//! use test_utils::TestDataBuilder;
//!
//! let builder = TestDataBuilder::from_test_name("test_search_ranks_by_similarity");
//! let shoe = builder
//!     .product(1)
//!     .title("Trail Runner")
//!     .category("Footwear")
//!     .embedding(vec![1.0, 0.0])
//!     .build();
//!
//! assert_eq!(shoe.pid, builder.pid(1));
//! ```

use chrono::{DateTime, Duration, TimeZone, Utc};
use domain_products::{NewProduct, Product};
use uuid::Uuid;

/// Builder for test data with deterministic values
///
/// The same test name always produces the same identifiers, so failures are
/// reproducible.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Create from test name (seed is the hash of the name)
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// Deterministic product ID for the `n`th fixture
    pub fn product_id(&self, n: u64) -> Uuid {
        let mut bytes = [0u8; 16];
        bytes[..8].copy_from_slice(&self.seed.to_le_bytes());
        bytes[8..].copy_from_slice(&n.to_be_bytes());
        Uuid::from_bytes(bytes)
    }

    /// Deterministic external catalog identifier for the `n`th fixture
    pub fn pid(&self, n: u64) -> String {
        format!("PID-{:x}-{}", self.seed & 0xffff, n)
    }

    /// Generate a unique name, e.g. "test-product-12345-main"
    pub fn name(&self, prefix: &str, suffix: &str) -> String {
        format!("test-{}-{}-{}", prefix, self.seed, suffix)
    }

    /// Start a product fixture; fixtures created with increasing `n` list in that order
    pub fn product(&self, n: u64) -> ProductBuilder {
        let created_at = base_time() + Duration::seconds(n as i64);

        let mut product = Product::new(NewProduct {
            pid: self.pid(n),
            title: self.name("product", &n.to_string()),
            brand: "Acme".to_string(),
            category: "General".to_string(),
            sub_category: "Misc".to_string(),
            actual_price: "1,000".to_string(),
            selling_price: "800".to_string(),
            discount: "20% off".to_string(),
            price_numeric: 800,
            average_rating: "4.0".to_string(),
            rating_numeric: 4.0,
            seller: "Test Seller".to_string(),
            ..Default::default()
        });
        product.id = self.product_id(n);
        product.created_at = created_at;
        product.updated_at = created_at;

        ProductBuilder { product }
    }
}

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

/// Fluent product fixture
#[derive(Debug, Clone)]
pub struct ProductBuilder {
    product: Product,
}

impl ProductBuilder {
    pub fn pid(mut self, pid: impl Into<String>) -> Self {
        self.product.pid = pid.into();
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.product.title = title.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.product.description = description.into();
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.product.category = category.into();
        self
    }

    pub fn price(mut self, price: i64) -> Self {
        self.product.price_numeric = price;
        self.product.selling_price = price.to_string();
        self
    }

    pub fn out_of_stock(mut self) -> Self {
        self.product.out_of_stock = true;
        self
    }

    pub fn embedding(mut self, embedding: Vec<f32>) -> Self {
        self.product.embedding = Some(embedding);
        self
    }

    pub fn build(self) -> Product {
        self.product
    }
}

/// Embedding helpers for similarity tests
pub mod vectors {
    /// Unit vector in the plane at `angle` radians from the x axis
    pub fn at_angle(angle: f32) -> Vec<f32> {
        vec![angle.cos(), angle.sin()]
    }

    /// `dimension`-long one-hot vector
    pub fn one_hot(dimension: usize, index: usize) -> Vec<f32> {
        let mut v = vec![0.0; dimension];
        if index < dimension {
            v[index] = 1.0;
        }
        v
    }
}

/// Test assertion helpers
pub mod assertions {
    use domain_products::Product;

    /// Assert the exact PID order of a result list
    pub fn assert_pids(actual: &[Product], expected: &[&str]) {
        let pids: Vec<&str> = actual.iter().map(|p| p.pid.as_str()).collect();
        assert_eq!(pids, expected, "unexpected product order");
    }

    /// Assert a list is sorted by descending score
    pub fn assert_descending(scores: &[f32]) {
        assert!(
            scores.windows(2).all(|w| w[0] >= w[1]),
            "scores are not in descending order: {:?}",
            scores
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_is_deterministic() {
        let a = TestDataBuilder::from_test_name("same");
        let b = TestDataBuilder::from_test_name("same");
        assert_eq!(a.product_id(3), b.product_id(3));
        assert_eq!(a.pid(3), b.pid(3));
        assert_ne!(a.product_id(3), a.product_id(4));
    }

    #[test]
    fn test_product_fixtures_order_by_index() {
        let builder = TestDataBuilder::from_test_name("order");
        let first = builder.product(1).build();
        let second = builder.product(2).build();
        assert!(first.created_at < second.created_at);
        assert!(!first.has_embedding());
    }

    #[test]
    fn test_one_hot() {
        assert_eq!(vectors::one_hot(3, 1), vec![0.0, 1.0, 0.0]);
    }
}
