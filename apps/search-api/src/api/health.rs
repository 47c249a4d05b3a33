//! Health check endpoints

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::state::AppState;

const SERVICE_NAME: &str = "search-api";

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    service: String,
    version: String,
}

#[derive(Serialize)]
struct ReadyResponse {
    status: String,
    service: String,
    version: String,
    /// Semantic search needs an embedding provider; without one only stats work
    semantic_search_enabled: bool,
    products: usize,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn ready(State(state): State<AppState>) -> Json<ReadyResponse> {
    let enabled = state.search.is_enabled();

    Json(ReadyResponse {
        status: if enabled { "ready" } else { "degraded" }.to_string(),
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        semantic_search_enabled: enabled,
        products: state.repository.len().await,
    })
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, Environment};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use core_config::ServerConfig;
    use domain_products::{InMemoryProductRepository, NewProduct};
    use domain_search::{SearchConfig, SemanticSearchService};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn state(repository: InMemoryProductRepository) -> AppState {
        let config = Config {
            server: ServerConfig::default(),
            search: SearchConfig::default(),
            environment: Environment::Development,
            seed_path: None,
            backfill_on_start: false,
        };
        let search = SemanticSearchService::from_config(repository.clone(), &config.search).unwrap();

        AppState {
            config,
            repository,
            search: Arc::new(search),
        }
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json(router(state(InMemoryProductRepository::new())), "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "search-api");
    }

    #[tokio::test]
    async fn test_ready_reports_disabled_search_and_catalog_size() {
        let repository = InMemoryProductRepository::new();
        repository
            .insert(NewProduct {
                pid: "SKU-1".to_string(),
                title: "Trail runner".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let (status, body) = get_json(router(state(repository)), "/ready").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["semantic_search_enabled"], false);
        assert_eq!(body["products"], 1);
    }
}
