//! Keeps the cache in step with the host's favorites.
//!
//! Entry points:
//! - `preload_all`: resolve every favorite (startup and periodic refresh)
//! - `on_favorite_added`: resolve one newly added favorite
//! - `on_favorites_changed`: resolve favorites the memory index does not hold yet

mod batch;
mod timer;

use std::sync::Arc;

use favcache_client::{FavoritesSource, list_favorite_urls};

use crate::pipeline::{FetchPipeline, ResolveOutcome};

pub use batch::{BatchSummary, resolve_batch};
pub use timer::RefreshTimer;

/// Drives batch resolution of the host's favorites through the pipeline.
pub struct Synchronizer {
    pipeline: Arc<FetchPipeline>,
    favorites: Arc<dyn FavoritesSource>,
    batch_size: usize,
}

impl Synchronizer {
    pub fn new(pipeline: Arc<FetchPipeline>, favorites: Arc<dyn FavoritesSource>, batch_size: usize) -> Self {
        Self { pipeline, favorites, batch_size }
    }

    /// Discover every favorite and resolve them all.
    pub async fn preload_all(&self) -> BatchSummary {
        let urls = list_favorite_urls(self.favorites.as_ref()).await;
        let summary = resolve_batch(&self.pipeline, &urls, self.batch_size).await;
        tracing::info!(
            total = summary.total,
            cached = summary.cached,
            fetched = summary.fetched,
            skipped = summary.skipped,
            failed = summary.failed,
            "preloaded favorites"
        );
        summary
    }

    /// Resolve a single favorite the host just added.
    pub async fn on_favorite_added(&self, url: &str) -> ResolveOutcome {
        tracing::debug!(url = %url, "favorite added");
        self.pipeline.resolve_outcome(url).await
    }

    /// Rediscover favorites and resolve only those the memory index lacks.
    pub async fn on_favorites_changed(&self) -> BatchSummary {
        let index = self.pipeline.index();
        let policy = self.pipeline.policy();
        let pending: Vec<String> = list_favorite_urls(self.favorites.as_ref())
            .await
            .into_iter()
            .filter(|url| !policy.cache_key(url).is_ok_and(|key| index.contains(&key)))
            .collect();

        let summary = resolve_batch(&self.pipeline, &pending, self.batch_size).await;
        tracing::info!(
            pending = summary.total,
            resolved = summary.resolved(),
            fetched = summary.fetched,
            failed = summary.failed,
            "synced changed favorites"
        );
        summary
    }
}
