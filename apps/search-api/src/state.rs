//! Application state management

use domain_products::InMemoryProductRepository;
use domain_search::SemanticSearchService;
use std::sync::Arc;

pub type SearchService = SemanticSearchService<InMemoryProductRepository>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: crate::config::Config,
    pub repository: InMemoryProductRepository,
    pub search: Arc<SearchService>,
}
