use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use domain_products::ProductError;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum SearchError {
    /// Semantic search is switched off (no provider credentials configured)
    #[error("Semantic search is unavailable: embeddings are not enabled")]
    EmbeddingsDisabled,

    /// The embedding client was built without a provider
    #[error("Embedding provider is not configured")]
    ProviderUnavailable,

    #[error("Embedding request failed: {0}")]
    EmbeddingRequestFailed(String),

    #[error("Embedding provider returned no vectors")]
    EmbeddingEmptyResponse,

    #[error("Invalid limit {0}: must be greater than zero")]
    InvalidLimit(i64),

    #[error("Invalid price range: min {min:?}, max {max:?}")]
    InvalidPriceRange { min: Option<i64>, max: Option<i64> },

    /// Reranking could not produce an ordering; always absorbed by the RAG fallback
    #[error("Rerank failed: {0}")]
    RerankFailed(String),

    #[error("An embedding backfill is already running")]
    BackfillInProgress,

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Product not found: {0}")]
    ProductNotFound(Uuid),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Product repository error: {0}")]
    Repository(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type SearchResult<T> = Result<T, SearchError>;

impl SearchError {
    /// Whether a caller may retry the same request later (with backoff)
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SearchError::EmbeddingRequestFailed(_)
                | SearchError::EmbeddingEmptyResponse
                | SearchError::Timeout(_)
                | SearchError::BackfillInProgress
        )
    }

    fn status(&self) -> StatusCode {
        match self {
            SearchError::EmbeddingsDisabled | SearchError::ProviderUnavailable => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            SearchError::EmbeddingRequestFailed(_) | SearchError::EmbeddingEmptyResponse => {
                StatusCode::BAD_GATEWAY
            }
            SearchError::InvalidLimit(_)
            | SearchError::InvalidPriceRange { .. }
            | SearchError::Validation(_) => StatusCode::BAD_REQUEST,
            SearchError::BackfillInProgress => StatusCode::CONFLICT,
            SearchError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            SearchError::ProductNotFound(_) => StatusCode::NOT_FOUND,
            SearchError::RerankFailed(_)
            | SearchError::Cancelled
            | SearchError::Repository(_)
            | SearchError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable identifier and numeric code for logs and clients
    fn code(&self) -> (&'static str, i32) {
        match self {
            SearchError::EmbeddingsDisabled => ("SEARCH_UNAVAILABLE", 3001),
            SearchError::ProviderUnavailable => ("PROVIDER_UNAVAILABLE", 3002),
            SearchError::EmbeddingRequestFailed(_) => ("EMBEDDING_REQUEST_FAILED", 3003),
            SearchError::EmbeddingEmptyResponse => ("EMBEDDING_EMPTY_RESPONSE", 3004),
            SearchError::InvalidLimit(_) => ("INVALID_LIMIT", 3005),
            SearchError::InvalidPriceRange { .. } => ("INVALID_PRICE_RANGE", 3006),
            SearchError::RerankFailed(_) => ("RERANK_FAILED", 3007),
            SearchError::BackfillInProgress => ("BACKFILL_IN_PROGRESS", 3008),
            SearchError::Cancelled => ("CANCELLED", 3009),
            SearchError::Timeout(_) => ("TIMEOUT", 3010),
            SearchError::ProductNotFound(_) => ("NOT_FOUND", 1004),
            SearchError::Validation(_) => ("VALIDATION_ERROR", 1001),
            SearchError::Repository(_) => ("REPOSITORY_ERROR", 3011),
            SearchError::Config(_) => ("CONFIG_ERROR", 3012),
        }
    }
}

impl From<ProductError> for SearchError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::NotFound(id) => SearchError::ProductNotFound(id),
            ProductError::Validation(msg) => SearchError::Validation(msg),
            other => SearchError::Repository(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        SearchError::EmbeddingRequestFailed(err.to_string())
    }
}

impl From<validator::ValidationErrors> for SearchError {
    fn from(err: validator::ValidationErrors) -> Self {
        SearchError::Validation(err.to_string())
    }
}

/// Standard error response body
///
/// ```json
/// { "code": 3001, "error": "SEARCH_UNAVAILABLE", "message": "...", "details": null }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Integer error code for logging and monitoring
    pub code: i32,
    /// Machine-readable error identifier
    pub error: String,
    /// Human-readable error message
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for SearchError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error, code) = self.code();

        if status.is_server_error() {
            tracing::error!(error_code = code, "{}", self);
        } else {
            tracing::info!(error_code = code, "{}", self);
        }

        let message = match self {
            // Never leak provider details to the client for a disabled feature
            SearchError::EmbeddingsDisabled | SearchError::ProviderUnavailable => {
                "Search unavailable".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(ErrorResponse {
            code,
            error: error.to_string(),
            message,
            details: None,
        });

        (status, body).into_response()
    }
}
