//! Enrichment orchestrator: bounded-concurrency fetch, format, embed, persist

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::sync::Semaphore;
use tracing::error;
use tracing::info;
use uuid::Uuid;

use super::fetcher::ProfileSource;
use super::formatter::format_enriched;
use super::progress::ProgressRegistry;
use crate::database::Database;
use crate::embeddings::EmbeddingIndex;
use crate::models::ContactRecord;
use crate::Result;

/// Runs enrichment for one user's not-yet-enriched contacts.
///
/// Each contact is processed by its own task; a counting admission gate
/// caps how many are in flight at once. Tasks beyond the cap wait at
/// gate acquisition - that is the only backpressure mechanism.
pub struct EnrichmentService {
    database: Arc<Database>,
    index: Arc<EmbeddingIndex>,
    fetcher: Arc<dyn ProfileSource>,
    progress: Arc<ProgressRegistry>,
    max_concurrent: usize,
    rate_limit: Duration,
}

impl EnrichmentService {
    pub fn new(
        config: &crate::config::AppConfig,
        database: Arc<Database>,
        index: Arc<EmbeddingIndex>,
        fetcher: Arc<dyn ProfileSource>,
        progress: Arc<ProgressRegistry>,
    ) -> Self {
        Self {
            database,
            index,
            fetcher,
            progress,
            max_concurrent: config.max_concurrent_requests(),
            rate_limit: Duration::from_millis(config.rate_limit_ms()),
        }
    }

    /// Enrich `connections` for `user_id`.
    ///
    /// Per-unit failures (fetch yielding nothing, embedding errors) are soft:
    /// logged, counted as settled, and never abort sibling units. The cache
    /// is persisted once after every unit has settled; progress is finalized
    /// unconditionally, even when that save fails.
    pub async fn run(&self, connections: Vec<ContactRecord>, user_id: Uuid) -> Result<()> {
        let total = connections.len();
        info!("Starting enrichment of {} contacts for user {}", total, user_id);

        let cache = self.database.load_contacts(user_id).await?;
        self.progress.start(user_id, total);

        let cache = Arc::new(Mutex::new(cache));
        let gate = Arc::new(Semaphore::new(self.max_concurrent));

        let units = connections.into_iter().map(|connection| {
            let cache = Arc::clone(&cache);
            let gate = Arc::clone(&gate);
            async move {
                let Ok(_permit) = gate.acquire().await else {
                    // The gate lives as long as this run; closure is unreachable.
                    self.progress.increment(user_id);
                    return;
                };

                self.enrich_one(connection, user_id, &cache).await;
                self.progress.increment(user_id);

                // Per-unit rate limiting toward the upstream data source.
                tokio::time::sleep(self.rate_limit).await;
            }
        });

        futures::future::join_all(units).await;

        let save_result = {
            let cache = cache.lock().await;
            self.database.save_contacts(user_id, &cache).await
        };

        // Finalize before propagating any save error.
        self.progress.finish(user_id, total);

        if let Err(e) = &save_result {
            error!("Failed to persist enriched cache for user {}: {}", user_id, e);
        } else {
            info!("Enrichment run completed for user {}", user_id);
        }

        save_result
    }

    async fn enrich_one(
        &self,
        connection: ContactRecord,
        user_id: Uuid,
        cache: &Mutex<HashMap<String, ContactRecord>>,
    ) {
        let raw = self.fetcher.fetch(&connection.url).await;
        let enriched = format_enriched(&connection, raw);

        if enriched.enriched {
            if let Err(e) = self.index.store(user_id, &enriched).await {
                // Soft failure: the record stays enriched-but-unvectorized
                // and is picked up by the next catch-up sweep.
                error!("Failed to vectorize {}: {}", enriched.url, e);
            }
        }

        cache.lock().await.insert(enriched.url.clone(), enriched);
    }

    /// Vectorize already-enriched contacts that missed vectorization.
    /// No fetch step and no progress tracking.
    pub async fn vectorization_catchup(&self, contacts: Vec<ContactRecord>, user_id: Uuid) {
        info!(
            "Starting vectorization catch-up for {} contacts",
            contacts.len()
        );
        self.index.batch_store(user_id, &contacts).await;
        info!("Vectorization catch-up completed");
    }
}
