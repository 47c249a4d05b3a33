use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Maximum description length carried into the embedding document text.
const EMBEDDING_DESCRIPTION_CHARS: usize = 500;

/// Product entity - a catalog entry that may carry a semantic embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    /// Unique identifier
    pub id: Uuid,
    /// External catalog identifier (unique)
    pub pid: String,
    /// Product title
    pub title: String,
    /// Brand name
    #[serde(default)]
    pub brand: String,
    /// Product description
    #[serde(default)]
    pub description: String,
    /// Top-level category
    #[serde(default)]
    pub category: String,
    /// Second-level category
    #[serde(default)]
    pub sub_category: String,
    /// List price as displayed (e.g. "1,999")
    #[serde(default)]
    pub actual_price: String,
    /// Selling price as displayed
    #[serde(default)]
    pub selling_price: String,
    /// Discount label as displayed (e.g. "20% off")
    #[serde(default)]
    pub discount: String,
    /// Selling price as an integer, used for range filters
    #[serde(default)]
    pub price_numeric: i64,
    /// Average rating as displayed
    #[serde(default)]
    pub average_rating: String,
    /// Average rating as a number
    #[serde(default)]
    pub rating_numeric: f32,
    #[serde(default)]
    pub out_of_stock: bool,
    #[serde(default)]
    pub seller: String,
    /// Free-form detail pairs (e.g. "Fabric": "Cotton")
    #[serde(default)]
    pub product_details: BTreeMap<String, String>,
    /// Semantic embedding, absent until generated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// DTO for registering a product in the catalog
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct NewProduct {
    #[validate(length(min = 1, max = 64))]
    pub pid: String,
    #[validate(length(min = 1, max = 500))]
    pub title: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub sub_category: String,
    #[serde(default)]
    pub actual_price: String,
    #[serde(default)]
    pub selling_price: String,
    #[serde(default)]
    pub discount: String,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub price_numeric: i64,
    #[serde(default)]
    pub average_rating: String,
    #[validate(range(min = 0.0, max = 5.0))]
    #[serde(default)]
    pub rating_numeric: f32,
    #[serde(default)]
    pub out_of_stock: bool,
    #[serde(default)]
    pub seller: String,
    #[serde(default)]
    pub product_details: BTreeMap<String, String>,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
}

/// Query filters for listing products
///
/// Every field narrows the result; `None` means "do not filter".
#[derive(Debug, Clone, Default, PartialEq, Deserialize, ToSchema, IntoParams)]
pub struct ProductFilter {
    /// Exact category match
    pub category: Option<String>,
    /// Exact sub-category match
    pub sub_category: Option<String>,
    /// Exact brand match
    pub brand: Option<String>,
    /// Minimum `price_numeric` (inclusive)
    pub min_price: Option<i64>,
    /// Maximum `price_numeric` (inclusive)
    pub max_price: Option<i64>,
    /// Only products that are (or are not) in stock
    pub in_stock: Option<bool>,
    /// Only products that do (or do not) carry a non-empty embedding
    pub has_embedding: Option<bool>,
}

/// 1-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub page_size: u64,
}

impl Pagination {
    pub fn new(page: u64, page_size: u64) -> Self {
        Self {
            page: page.max(1),
            page_size,
        }
    }

    /// First page holding up to `page_size` entries
    pub fn first(page_size: u64) -> Self {
        Self::new(1, page_size)
    }

    pub fn next(self) -> Self {
        Self {
            page: self.page + 1,
            ..self
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

/// One page of products plus the total number of matches
#[derive(Debug, Clone, Default)]
pub struct ProductPage {
    pub items: Vec<Product>,
    pub total: u64,
}

impl Product {
    /// Create a new product from the NewProduct DTO
    pub fn new(input: NewProduct) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            pid: input.pid,
            title: input.title,
            brand: input.brand,
            description: input.description,
            category: input.category,
            sub_category: input.sub_category,
            actual_price: input.actual_price,
            selling_price: input.selling_price,
            discount: input.discount,
            price_numeric: input.price_numeric,
            average_rating: input.average_rating,
            rating_numeric: input.rating_numeric,
            out_of_stock: input.out_of_stock,
            seller: input.seller,
            product_details: input.product_details,
            embedding: input.embedding.filter(|e| !e.is_empty()),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the product carries a usable embedding
    pub fn has_embedding(&self) -> bool {
        self.embedding.as_ref().is_some_and(|e| !e.is_empty())
    }

    pub fn is_in_stock(&self) -> bool {
        !self.out_of_stock
    }

    /// Check the product against a listing filter
    pub fn matches(&self, filter: &ProductFilter) -> bool {
        if let Some(ref category) = filter.category {
            if &self.category != category {
                return false;
            }
        }
        if let Some(ref sub_category) = filter.sub_category {
            if &self.sub_category != sub_category {
                return false;
            }
        }
        if let Some(ref brand) = filter.brand {
            if &self.brand != brand {
                return false;
            }
        }
        if let Some(min) = filter.min_price {
            if self.price_numeric < min {
                return false;
            }
        }
        if let Some(max) = filter.max_price {
            if self.price_numeric > max {
                return false;
            }
        }
        if let Some(in_stock) = filter.in_stock {
            if self.is_in_stock() != in_stock {
                return false;
            }
        }
        if let Some(has_embedding) = filter.has_embedding {
            if self.has_embedding() != has_embedding {
                return false;
            }
        }
        true
    }

    /// Document text submitted to the embedding provider for this product
    pub fn embedding_text(&self) -> String {
        let mut text = String::new();

        text.push_str(&format!("Title: {}\n", self.title));
        text.push_str(&format!("Brand: {}\n", self.brand));
        text.push_str(&format!(
            "Category: {} - {}\n",
            self.category, self.sub_category
        ));

        let description = self.description.trim();
        if !description.is_empty() {
            text.push_str(&format!(
                "Description: {}\n",
                truncate_chars(description, EMBEDDING_DESCRIPTION_CHARS)
            ));
        }

        if !self.product_details.is_empty() {
            text.push_str("Details: ");
            for (key, value) in &self.product_details {
                text.push_str(&format!("{}: {}, ", key, value));
            }
            text.push('\n');
        }

        text.push_str(&format!(
            "Price: {} (Discounted: {})\n",
            self.actual_price, self.selling_price
        ));
        text.push_str(&format!("Rating: {}\n", self.average_rating));
        text.push_str(&format!("Seller: {}\n", self.seller));

        text
    }
}

/// Truncate to at most `max` characters, appending "..." when shortened
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Product {
        Product::new(NewProduct {
            pid: "PID-1".to_string(),
            title: "Trail Runner".to_string(),
            brand: "Stride".to_string(),
            category: "Footwear".to_string(),
            sub_category: "Running".to_string(),
            price_numeric: 2499,
            ..Default::default()
        })
    }

    #[test]
    fn test_empty_embedding_is_treated_as_absent() {
        let product = Product::new(NewProduct {
            pid: "p".to_string(),
            title: "t".to_string(),
            embedding: Some(vec![]),
            ..Default::default()
        });
        assert!(product.embedding.is_none());
        assert!(!product.has_embedding());
    }

    #[test]
    fn test_filter_price_bounds_are_inclusive() {
        let product = sample();
        let filter = ProductFilter {
            min_price: Some(2499),
            max_price: Some(2499),
            ..Default::default()
        };
        assert!(product.matches(&filter));

        let filter = ProductFilter {
            max_price: Some(2498),
            ..Default::default()
        };
        assert!(!product.matches(&filter));
    }

    #[test]
    fn test_filter_by_embedding_presence() {
        let mut product = sample();
        let with = ProductFilter {
            has_embedding: Some(true),
            ..Default::default()
        };
        assert!(!product.matches(&with));

        product.embedding = Some(vec![0.1, 0.2]);
        assert!(product.matches(&with));
    }

    #[test]
    fn test_embedding_text_contains_hierarchy_and_truncates_description() {
        let mut product = sample();
        product.description = "x".repeat(600);
        let text = product.embedding_text();

        assert!(text.contains("Title: Trail Runner\n"));
        assert!(text.contains("Category: Footwear - Running\n"));
        assert!(text.contains(&format!("Description: {}...\n", "x".repeat(500))));
        assert!(!text.contains(&"x".repeat(501)));
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé...");
        assert_eq!(truncate_chars("short", 10), "short");
    }

    #[test]
    fn test_pagination_offset() {
        let page = Pagination::first(20);
        assert_eq!(page.offset(), 0);
        assert_eq!(page.next().offset(), 20);
        assert_eq!(Pagination::new(0, 10).page, 1);
    }
}
