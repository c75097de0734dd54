//! Process-wide per-user enrichment progress registry

use dashmap::DashMap;
use uuid::Uuid;

use crate::models::EnrichmentProgress;

/// Concurrent map from user to enrichment progress.
///
/// Entries are created lazily on first read and never torn down; progress
/// only needs to survive for the lifetime of the process. Increments go
/// through the map's per-entry locking, so concurrent units of work never
/// lose counts.
#[derive(Debug, Default)]
pub struct ProgressRegistry {
    inner: DashMap<Uuid, EnrichmentProgress>,
}

impl ProgressRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current progress for a user; an idle default before any run.
    #[must_use]
    pub fn get(&self, user_id: Uuid) -> EnrichmentProgress {
        *self
            .inner
            .entry(user_id)
            .or_insert_with(EnrichmentProgress::default)
            .value()
    }

    /// Reset progress at the start of a run of `total` units.
    pub fn start(&self, user_id: Uuid, total: usize) {
        self.inner.insert(
            user_id,
            EnrichmentProgress {
                current: 0,
                total,
                completed: false,
                in_progress: true,
            },
        );
    }

    /// Record one settled unit (success or failure both count).
    pub fn increment(&self, user_id: Uuid) {
        self.inner
            .entry(user_id)
            .and_modify(|progress| progress.current += 1);
    }

    /// Finalize a run. Always called, even when persistence fails.
    pub fn finish(&self, user_id: Uuid, total: usize) {
        self.inner.insert(
            user_id,
            EnrichmentProgress {
                current: total,
                total,
                completed: true,
                in_progress: false,
            },
        );
    }
}
