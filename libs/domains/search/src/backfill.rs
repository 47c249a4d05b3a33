//! Embedding backfill: attach embeddings to catalog products that lack one.
//!
//! Only one backfill runs at a time per job. A run is resumable; products that
//! already carry an embedding are skipped without a provider call, so running
//! twice in a row makes no provider calls the second time.

use domain_products::{Pagination, Product, ProductFilter, ProductRepository};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::embedding::EmbeddingClient;
use crate::error::{SearchError, SearchResult};

/// Counters for a finished backfill run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct BackfillReport {
    /// Catalog pages (or rounds) processed
    pub pages: u64,
    /// Products examined
    pub scanned: u64,
    /// Products that already had an embedding
    pub skipped: u64,
    /// Embeddings generated and persisted
    pub embedded: u64,
    /// Products whose embedding could not be generated or persisted
    pub failed: u64,
}

impl BackfillReport {
    fn absorb(&mut self, batch: &BatchOutcome) {
        self.embedded += batch.embedded;
        self.failed += batch.failed;
    }
}

#[derive(Debug, Default)]
struct BatchOutcome {
    embedded: u64,
    failed: u64,
}

/// Which products a backfill visits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BackfillMode {
    /// Page through the whole catalog, skipping embedded products
    #[default]
    Catalog,
    /// Fetch only products without embeddings, round after round
    MissingOnly,
}

/// Single-flight guard for a running backfill
pub struct BackfillGuard {
    _guard: OwnedMutexGuard<()>,
}

pub struct BackfillJob<R: ProductRepository> {
    repository: Arc<R>,
    embeddings: Arc<EmbeddingClient>,
    delay: Duration,
    running: Arc<Mutex<()>>,
    last_report: RwLock<Option<BackfillReport>>,
}

impl<R: ProductRepository + 'static> BackfillJob<R> {
    pub fn new(repository: Arc<R>, embeddings: Arc<EmbeddingClient>, delay: Duration) -> Self {
        Self {
            repository,
            embeddings,
            delay,
            running: Arc::new(Mutex::new(())),
            last_report: RwLock::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.try_lock().is_err()
    }

    /// Counters of the most recent run that finished without error
    pub async fn last_report(&self) -> Option<BackfillReport> {
        *self.last_report.read().await
    }

    /// Claim the single-flight slot or fail with `BackfillInProgress`
    pub fn try_acquire(&self) -> SearchResult<BackfillGuard> {
        let guard = Arc::clone(&self.running)
            .try_lock_owned()
            .map_err(|_| SearchError::BackfillInProgress)?;
        Ok(BackfillGuard { _guard: guard })
    }

    fn preflight(&self, batch_size: u64) -> SearchResult<()> {
        if !self.embeddings.is_enabled() {
            return Err(SearchError::EmbeddingsDisabled);
        }
        if batch_size == 0 {
            return Err(SearchError::Validation(
                "batch size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Walk the whole catalog page by page, embedding what is missing
    pub async fn backfill(
        &self,
        batch_size: u64,
        cancel: &CancellationToken,
    ) -> SearchResult<BackfillReport> {
        self.run(BackfillMode::Catalog, batch_size, cancel).await
    }

    /// Repeatedly fetch products without embeddings until none remain.
    ///
    /// Stops early when a round attaches nothing, so persistent provider
    /// failures cannot loop forever.
    pub async fn backfill_missing(
        &self,
        batch_size: u64,
        cancel: &CancellationToken,
    ) -> SearchResult<BackfillReport> {
        self.run(BackfillMode::MissingOnly, batch_size, cancel).await
    }

    pub async fn run(
        &self,
        mode: BackfillMode,
        batch_size: u64,
        cancel: &CancellationToken,
    ) -> SearchResult<BackfillReport> {
        self.preflight(batch_size)?;
        let guard = self.try_acquire()?;
        self.run_guarded(mode, batch_size, cancel, guard).await
    }

    /// Start a backfill on a background task.
    ///
    /// The single-flight slot is claimed before spawning, so a second caller
    /// gets `BackfillInProgress` immediately.
    pub fn spawn(
        self: &Arc<Self>,
        mode: BackfillMode,
        batch_size: u64,
        cancel: CancellationToken,
    ) -> SearchResult<JoinHandle<SearchResult<BackfillReport>>> {
        self.preflight(batch_size)?;
        let guard = self.try_acquire()?;

        let job = Arc::clone(self);
        Ok(tokio::spawn(async move {
            let result = job.run_guarded(mode, batch_size, &cancel, guard).await;
            if let Err(e) = &result {
                tracing::error!(error = %e, ?mode, "Background backfill failed");
            }
            result
        }))
    }

    async fn run_guarded(
        &self,
        mode: BackfillMode,
        batch_size: u64,
        cancel: &CancellationToken,
        _guard: BackfillGuard,
    ) -> SearchResult<BackfillReport> {
        let report = match mode {
            BackfillMode::Catalog => self.scan_catalog(batch_size, cancel).await?,
            BackfillMode::MissingOnly => self.drain_missing(batch_size, cancel).await?,
        };

        *self.last_report.write().await = Some(report);
        tracing::info!(?report, ?mode, "Embedding backfill complete");
        Ok(report)
    }

    #[instrument(skip(self, cancel))]
    async fn drain_missing(
        &self,
        batch_size: u64,
        cancel: &CancellationToken,
    ) -> SearchResult<BackfillReport> {
        let mut report = BackfillReport::default();

        loop {
            if cancel.is_cancelled() {
                return Err(SearchError::Cancelled);
            }

            let products = self
                .repository
                .products_without_embeddings(batch_size)
                .await?;
            if products.is_empty() {
                break;
            }

            report.pages += 1;
            report.scanned += products.len() as u64;

            let batch = self.embed_batch(products, cancel).await?;
            report.absorb(&batch);

            if batch.embedded == 0 {
                tracing::warn!(failed = batch.failed, "No embeddings attached this round, stopping");
                break;
            }
        }

        Ok(report)
    }

    #[instrument(skip(self, cancel))]
    async fn scan_catalog(
        &self,
        batch_size: u64,
        cancel: &CancellationToken,
    ) -> SearchResult<BackfillReport> {
        let mut report = BackfillReport::default();
        let mut page = Pagination::first(batch_size);

        loop {
            if cancel.is_cancelled() {
                tracing::info!(?report, "Backfill cancelled");
                return Err(SearchError::Cancelled);
            }

            let listing = self
                .repository
                .list_products(ProductFilter::default(), page)
                .await?;
            let fetched = listing.items.len() as u64;
            if fetched == 0 {
                break;
            }

            report.pages += 1;
            report.scanned += fetched;

            let (embedded, missing): (Vec<Product>, Vec<Product>) =
                listing.items.into_iter().partition(Product::has_embedding);
            report.skipped += embedded.len() as u64;

            let batch = self.embed_batch(missing, cancel).await?;
            report.absorb(&batch);

            tracing::debug!(
                page = page.page,
                fetched,
                embedded = batch.embedded,
                failed = batch.failed,
                "Processed backfill page"
            );

            if fetched < batch_size {
                break;
            }
            page = page.next();
        }

        Ok(report)
    }

    /// Embed each product in turn, then persist the successes in one write
    async fn embed_batch(
        &self,
        products: Vec<Product>,
        cancel: &CancellationToken,
    ) -> SearchResult<BatchOutcome> {
        let mut outcome = BatchOutcome::default();
        let mut vectors: HashMap<Uuid, Vec<f32>> = HashMap::with_capacity(products.len());

        for product in products {
            let text = product.embedding_text();
            let result = tokio::select! {
                _ = cancel.cancelled() => return Err(SearchError::Cancelled),
                result = self.embeddings.embed(&text) => result,
            };

            match result {
                Ok(vector) => {
                    vectors.insert(product.id, vector);
                }
                Err(e) => {
                    outcome.failed += 1;
                    tracing::warn!(
                        product_id = %product.id,
                        pid = %product.pid,
                        error = %e,
                        "Failed to generate embedding"
                    );
                }
            }

            self.pause(cancel).await?;
        }

        if vectors.is_empty() {
            return Ok(outcome);
        }

        let count = vectors.len() as u64;
        match self.repository.batch_update_embeddings(vectors).await {
            Ok(()) => outcome.embedded += count,
            Err(e) => {
                outcome.failed += count;
                tracing::error!(count, error = %e, "Failed to persist embedding batch");
            }
        }

        Ok(outcome)
    }

    async fn pause(&self, cancel: &CancellationToken) -> SearchResult<()> {
        if self.delay.is_zero() {
            return Ok(());
        }
        tokio::select! {
            _ = cancel.cancelled() => Err(SearchError::Cancelled),
            _ = tokio::time::sleep(self.delay) => Ok(()),
        }
    }
}
