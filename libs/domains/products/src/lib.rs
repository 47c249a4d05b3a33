//! Products Domain
//!
//! The product catalog as seen by the semantic search core: the `Product`
//! entity, listing filters, and the repository contract search reads through.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │  ProductRepository   │  ← Catalog access contract (trait)
//! └──────────┬───────────┘
//!            │
//! ┌──────────▼───────────┐
//! │InMemoryProductRepo   │  ← Development/test implementation, JSON seedable
//! └──────────┬───────────┘
//!            │
//! ┌──────────▼───────────┐
//! │       Models         │  ← Product, NewProduct, ProductFilter, Pagination
//! └──────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_products::{InMemoryProductRepository, Pagination, ProductFilter, ProductRepository};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let repository = InMemoryProductRepository::new();
//! repository.seed_from_file("catalog.json").await?;
//!
//! let page = repository
//!     .list_products(ProductFilter::default(), Pagination::first(20))
//!     .await?;
//! println!("{} of {} products", page.items.len(), page.total);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod memory;
pub mod models;
pub mod repository;

// Re-export commonly used types
pub use error::{ProductError, ProductResult};
pub use memory::InMemoryProductRepository;
pub use models::{NewProduct, Pagination, Product, ProductFilter, ProductPage, truncate_chars};
pub use repository::ProductRepository;

#[cfg(any(test, feature = "mock"))]
pub use repository::MockProductRepository;
