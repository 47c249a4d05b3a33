//! HTTP handlers for the Search API

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use domain_products::{Product, ProductRepository};
use std::sync::Arc;
use utoipa::OpenApi;
use uuid::Uuid;

use crate::backfill::{BackfillMode, BackfillReport};
use crate::error::{ErrorResponse, SearchResult};
use crate::models::{
    BackfillRequest, BackfillStarted, BackfillStatus, EmbeddingStats, ProductEmbeddingResponse,
    ProductHit, RagSearchRequest, RagSearchResponse, SearchRequest, SearchResponse,
};
use crate::rag::RerankOutcome;
use crate::service::SemanticSearchService;

/// OpenAPI documentation for the Search API
#[derive(OpenApi)]
#[openapi(
    paths(
        semantic_search,
        rag_search,
        start_backfill,
        backfill_status,
        generate_product_embedding,
        embedding_stats,
    ),
    components(schemas(
        Product,
        ProductHit,
        SearchResponse,
        RagSearchRequest,
        RagSearchResponse,
        RerankOutcome,
        BackfillRequest,
        BackfillStarted,
        BackfillStatus,
        BackfillReport,
        BackfillMode,
        ProductEmbeddingResponse,
        EmbeddingStats,
        ErrorResponse,
    )),
    tags(
        (name = "Search", description = "Semantic and retrieval-augmented product search"),
        (name = "Embeddings", description = "Product embedding maintenance")
    )
)]
pub struct ApiDoc;

type SharedService<R> = State<Arc<SemanticSearchService<R>>>;

/// Create the search router with all HTTP endpoints
pub fn router<R: ProductRepository + 'static>(service: Arc<SemanticSearchService<R>>) -> Router {
    Router::new()
        .route("/search", get(semantic_search))
        .route("/search/rag", post(rag_search))
        .route(
            "/embeddings/backfill",
            post(start_backfill).get(backfill_status),
        )
        .route("/embeddings/stats", get(embedding_stats))
        .route("/embeddings/products/{id}", post(generate_product_embedding))
        .with_state(service)
}

/// Rank products by semantic similarity to a query
#[utoipa::path(
    get,
    path = "/search",
    tag = "Search",
    params(SearchRequest),
    responses(
        (status = 200, description = "Ranked products, best match first", body = SearchResponse),
        (status = 400, description = "Invalid limit, price range or query", body = ErrorResponse),
        (status = 502, description = "Embedding provider failed", body = ErrorResponse),
        (status = 503, description = "Search unavailable", body = ErrorResponse),
        (status = 504, description = "Search timed out", body = ErrorResponse)
    )
)]
async fn semantic_search<R: ProductRepository + 'static>(
    State(service): SharedService<R>,
    Query(request): Query<SearchRequest>,
) -> SearchResult<Json<SearchResponse>> {
    let ranked = service.search(request).await?;
    Ok(Json(SearchResponse::from(ranked)))
}

/// Semantic search refined by a language model
#[utoipa::path(
    post,
    path = "/search/rag",
    tag = "Search",
    request_body = RagSearchRequest,
    responses(
        (status = 200, description = "Products in reranked (or vector) order", body = RagSearchResponse),
        (status = 400, description = "Invalid limit or prompt", body = ErrorResponse),
        (status = 503, description = "Search unavailable", body = ErrorResponse)
    )
)]
async fn rag_search<R: ProductRepository + 'static>(
    State(service): SharedService<R>,
    Json(request): Json<RagSearchRequest>,
) -> SearchResult<Json<RagSearchResponse>> {
    let outcome = service.rag_search(request).await?;
    Ok(Json(RagSearchResponse::from(outcome)))
}

/// Start an embedding backfill in the background
#[utoipa::path(
    post,
    path = "/embeddings/backfill",
    tag = "Embeddings",
    request_body = BackfillRequest,
    responses(
        (status = 202, description = "Backfill started", body = BackfillStarted),
        (status = 409, description = "A backfill is already running", body = ErrorResponse),
        (status = 503, description = "Embeddings disabled", body = ErrorResponse)
    )
)]
async fn start_backfill<R: ProductRepository + 'static>(
    State(service): SharedService<R>,
    Json(request): Json<BackfillRequest>,
) -> SearchResult<(StatusCode, Json<BackfillStarted>)> {
    let started = service.start_backfill(request)?;
    Ok((StatusCode::ACCEPTED, Json(started)))
}

/// Whether a backfill is running, plus the last finished report
#[utoipa::path(
    get,
    path = "/embeddings/backfill",
    tag = "Embeddings",
    responses(
        (status = 200, description = "Backfill status", body = BackfillStatus)
    )
)]
async fn backfill_status<R: ProductRepository + 'static>(
    State(service): SharedService<R>,
) -> Json<BackfillStatus> {
    Json(service.backfill_status().await)
}

/// Generate the embedding of one product
#[utoipa::path(
    post,
    path = "/embeddings/products/{id}",
    tag = "Embeddings",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Embedding stored", body = ProductEmbeddingResponse),
        (status = 404, description = "Product not found", body = ErrorResponse),
        (status = 503, description = "Embeddings disabled", body = ErrorResponse)
    )
)]
async fn generate_product_embedding<R: ProductRepository + 'static>(
    State(service): SharedService<R>,
    Path(id): Path<Uuid>,
) -> SearchResult<Json<ProductEmbeddingResponse>> {
    let response = service.generate_product_embedding(id).await?;
    Ok(Json(response))
}

/// Embedding coverage of the catalog
#[utoipa::path(
    get,
    path = "/embeddings/stats",
    tag = "Embeddings",
    responses(
        (status = 200, description = "Coverage counters", body = EmbeddingStats),
        (status = 500, description = "Repository error", body = ErrorResponse)
    )
)]
async fn embedding_stats<R: ProductRepository + 'static>(
    State(service): SharedService<R>,
) -> SearchResult<Json<EmbeddingStats>> {
    Ok(Json(service.embedding_stats().await?))
}
