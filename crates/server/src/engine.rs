//! The cache engine: one owner for the memory index, the record store, the
//! refresh timer and the startup preload.
//!
//! Nothing on the engine's public surface returns an error. Resolves
//! converge to "no handle", boundary lookups return their input unchanged,
//! and storage failures degrade to misses (they are logged where they occur).

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::watch;

use favcache_client::{FavoritesSource, Fetcher, UrlPolicy};
use favcache_core::{AppConfig, CacheConfig, ConfigError, EntryInfo, LocalHandle, MemoryIndex, RecordStore};

use crate::eviction;
use crate::pipeline::FetchPipeline;
use crate::sync::{BatchSummary, RefreshTimer, Synchronizer};

/// Engine settings taken from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub cache: CacheConfig,
    pub batch_size: usize,
    pub preload_delay: Duration,
    pub blocked_proxy_domains: Vec<String>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for EngineOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            cache: config.cache,
            batch_size: config.batch_size,
            preload_delay: config.preload_delay(),
            blocked_proxy_domains: config.blocked_proxy_domains.clone(),
        }
    }
}

/// Owns all cache state for one host session.
pub struct CacheEngine {
    config: Mutex<CacheConfig>,
    preload_delay: Duration,
    pipeline: Arc<FetchPipeline>,
    sync: Arc<Synchronizer>,
    timer: RefreshTimer,
    /// Dropping the sender cancels a startup preload still in its delay.
    preload: Mutex<Option<watch::Sender<()>>>,
}

impl CacheEngine {
    pub fn new(
        options: EngineOptions, store: RecordStore, fetcher: Arc<dyn Fetcher>, favorites: Arc<dyn FavoritesSource>,
    ) -> Self {
        let pipeline = Arc::new(FetchPipeline::new(
            Arc::new(store),
            Arc::new(MemoryIndex::new()),
            fetcher,
            UrlPolicy::new(&options.blocked_proxy_domains),
            options.cache.max_entries,
        ));
        let sync = Arc::new(Synchronizer::new(Arc::clone(&pipeline), favorites, options.batch_size));

        Self {
            config: Mutex::new(options.cache),
            preload_delay: options.preload_delay,
            pipeline,
            sync,
            timer: RefreshTimer::new(),
            preload: Mutex::new(None),
        }
    }

    fn config_slot(&self) -> MutexGuard<'_, CacheConfig> {
        self.config.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn preload_slot(&self) -> MutexGuard<'_, Option<watch::Sender<()>>> {
        self.preload.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current cache settings.
    pub fn config(&self) -> CacheConfig {
        *self.config_slot()
    }

    /// Start background work: the delayed startup preload (when enabled)
    /// and the periodic refresh.
    ///
    /// Once the delay has passed the preload runs to completion, even if the
    /// engine is stopped meanwhile.
    pub fn start(&self) {
        let config = self.config();
        if config.preload_on_startup {
            let sync = Arc::clone(&self.sync);
            let delay = self.preload_delay;
            let (cancel, mut cancelled) = watch::channel(());
            tokio::spawn(async move {
                tokio::select! {
                    biased;
                    _ = cancelled.changed() => {
                        tracing::debug!("startup preload cancelled");
                        return;
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
                sync.preload_all().await;
            });
            *self.preload_slot() = Some(cancel);
            tracing::info!(delay_ms = delay.as_millis() as u64, "scheduled startup preload");
        }
        self.schedule_refresh(config.refresh_interval());
    }

    /// Stop background work and release every memory handle.
    ///
    /// Resolves already in flight are not cancelled and still write their
    /// records. Nothing is flushed; the record store is already durable.
    pub fn stop(&self) -> usize {
        self.timer.cancel();
        *self.preload_slot() = None;
        let released = self.pipeline.index().clear();
        tracing::info!(released, "cache engine stopped");
        released
    }

    fn schedule_refresh(&self, period: Option<Duration>) {
        let sync = Arc::clone(&self.sync);
        self.timer.schedule(period, move || {
            let sync = Arc::clone(&sync);
            async move {
                sync.preload_all().await;
            }
        });
    }

    /// Period of the running refresh timer.
    pub fn refresh_period(&self) -> Option<Duration> {
        self.timer.period()
    }

    /// Replace the cache settings.
    ///
    /// The refresh timer is rescheduled only when its period changes. A lower
    /// `max_entries` trims the store right away.
    pub async fn update_config(&self, config: CacheConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let previous = std::mem::replace(&mut *self.config_slot(), config);

        self.pipeline.set_max_entries(config.max_entries);
        if previous.refresh_interval() != config.refresh_interval() {
            self.schedule_refresh(config.refresh_interval());
        }
        if config.max_entries < previous.max_entries {
            eviction::enforce(self.pipeline.store(), self.pipeline.index(), config.max_entries).await;
        }

        tracing::info!(
            preload_on_startup = config.preload_on_startup,
            refresh_interval_minutes = config.refresh_interval_minutes,
            max_entries = config.max_entries,
            "cache settings updated"
        );
        Ok(())
    }

    /// Resolve `url` to a local handle, waiting for retrieval if needed.
    pub async fn resolve(&self, url: &str) -> Option<LocalHandle> {
        self.pipeline.resolve(url).await
    }

    /// Boundary lookup for rendering: the handle if `url` is cached in
    /// memory, otherwise `url` itself.
    ///
    /// A miss starts a background resolve so a later lookup can hit.
    pub fn forward_resolve(&self, url: &str) -> String {
        self.lookup_or_warm(url)
            .map_or_else(|| url.to_string(), LocalHandle::into_string)
    }

    /// The memory handle for `url`, starting a background resolve on a miss.
    pub fn lookup_or_warm(&self, url: &str) -> Option<LocalHandle> {
        let key = self.pipeline.policy().cache_key(url).ok()?;
        if let Some(handle) = self.pipeline.index().lookup(&key) {
            return Some(handle);
        }

        let pipeline = Arc::clone(&self.pipeline);
        tokio::spawn(async move {
            pipeline.resolve(&key).await;
        });
        None
    }

    /// Boundary lookup for persisting: the original URL behind a handle,
    /// otherwise `value` itself.
    pub fn reverse_resolve(&self, value: &str) -> String {
        self.pipeline
            .index()
            .reverse_lookup(value)
            .unwrap_or_else(|| value.to_string())
    }

    /// Bytes behind a live handle.
    pub fn payload(&self, handle: &str) -> Option<Bytes> {
        self.pipeline.index().payload(handle)
    }

    pub async fn preload_all(&self) -> BatchSummary {
        self.sync.preload_all().await
    }

    pub async fn on_favorite_added(&self, url: &str) -> Option<LocalHandle> {
        self.sync.on_favorite_added(url).await.into_handle()
    }

    pub async fn on_favorites_changed(&self) -> BatchSummary {
        self.sync.on_favorites_changed().await
    }

    /// Metadata for every stored record, oldest first.
    pub async fn list_entries(&self) -> Vec<EntryInfo> {
        self.pipeline.store().entries().await
    }

    /// Forget `url` in both tiers. Returns true if a record was deleted.
    pub async fn delete_entry(&self, url: &str) -> bool {
        let key = self
            .pipeline
            .policy()
            .cache_key(url)
            .unwrap_or_else(|_| url.trim().to_string());
        self.pipeline.index().release(&key);
        self.pipeline.store().delete(&key).await
    }

    /// Forget everything in both tiers. Returns the number of records deleted.
    pub async fn clear_all(&self) -> u64 {
        let released = self.pipeline.index().clear();
        let deleted = self.pipeline.store().clear().await;
        tracing::info!(released, deleted, "cleared cache");
        deleted
    }

    /// Number of live memory handles.
    pub fn memory_entries(&self) -> usize {
        self.pipeline.index().len()
    }
}
