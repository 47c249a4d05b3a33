//! Search API - semantic product search over an in-memory catalog

use core_config::tracing::{init_tracing, install_color_eyre};
use domain_products::InMemoryProductRepository;
use domain_search::{BackfillRequest, SemanticSearchService};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

mod api;
mod config;
mod openapi;
mod server;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    let repository = InMemoryProductRepository::new();
    if let Some(path) = &config.seed_path {
        let inserted = repository.seed_from_file(path).await?;
        info!(path = %path.display(), inserted, "Catalog loaded");
    } else {
        warn!("PRODUCTS_SEED_PATH is not set, starting with an empty catalog");
    }

    let shutdown = CancellationToken::new();
    let search = SemanticSearchService::from_config(repository.clone(), &config.search)?
        .with_shutdown(shutdown.clone());

    let state = AppState {
        config: config.clone(),
        repository,
        search: Arc::new(search),
    };

    if config.backfill_on_start {
        let request = BackfillRequest {
            batch_size: None,
            missing_only: true,
        };
        match state.search.start_backfill(request) {
            Ok(started) => info!(batch_size = started.batch_size, "Startup backfill running"),
            Err(e) => warn!(error = %e, "Startup backfill skipped"),
        }
    }

    let app = api::routes(&state);

    info!(
        "Starting Search API on {} (semantic search {})",
        config.server.address(),
        if state.search.is_enabled() { "enabled" } else { "disabled" }
    );

    server::serve(app, &config.server, shutdown)
        .await
        .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Search API shutdown complete");
    Ok(())
}
