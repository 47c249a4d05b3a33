//! OpenAPI documentation configuration

use utoipa::OpenApi;

/// Combined OpenAPI documentation for the Search API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Search API",
        version = "0.1.0",
        description = "Semantic and retrieval-augmented product search",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    nest(
        (path = "/api", api = domain_search::ApiDoc)
    )
)]
pub struct ApiDoc;
