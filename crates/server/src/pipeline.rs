//! Cache-or-fetch resolution of a remote URL to a local handle.
//!
//! ### Resolution order
//! 1. Refuse URLs that must not be cached (no side effects)
//! 2. Memory index hit: return the live handle, no I/O
//! 3. Record store hit: materialize a handle from the stored payload
//! 4. Network: fetch, persist, evict, then materialize
//!
//! A handle is only returned once its record is confirmed in the store after
//! materializing. An eviction that ran in between either released the handle
//! itself or is caught by that check.
//!
//! Concurrent resolves of the same cache key wait on a shared gate, so only
//! the first one reaches the store or the network and the rest observe its
//! result in the memory index.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use tokio::sync::Mutex;

use favcache_client::{Fetcher, SkipReason, UrlPolicy};
use favcache_core::{Error, LocalHandle, MemoryIndex, RecordStore};

use crate::eviction;

/// Tier a handle was served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Memory,
    Store,
    Network,
}

/// Why a cacheable URL could not be resolved.
#[derive(Debug)]
pub enum FailureReason {
    /// Transport error or non-success status.
    Fetch(Error),
    /// The payload was fetched but could not be written to the store.
    NotPersisted,
    /// The record was evicted by a concurrent write before a handle could be
    /// registered for it.
    Evicted,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Fetch(e) => write!(f, "{e}"),
            FailureReason::NotPersisted => f.write_str("fetched payload could not be stored"),
            FailureReason::Evicted => f.write_str("record was evicted before it could be served"),
        }
    }
}

/// Result of a single resolve.
#[derive(Debug)]
pub enum ResolveOutcome {
    Hit { handle: LocalHandle, tier: Tier },
    Skipped(SkipReason),
    Failed(FailureReason),
}

impl ResolveOutcome {
    pub fn handle(&self) -> Option<&LocalHandle> {
        match self {
            ResolveOutcome::Hit { handle, .. } => Some(handle),
            _ => None,
        }
    }

    pub fn into_handle(self) -> Option<LocalHandle> {
        match self {
            ResolveOutcome::Hit { handle, .. } => Some(handle),
            _ => None,
        }
    }
}

type Gate = Arc<Mutex<()>>;

/// Resolves URLs against the memory index, the record store and the network.
pub struct FetchPipeline {
    store: Arc<RecordStore>,
    index: Arc<MemoryIndex>,
    fetcher: Arc<dyn Fetcher>,
    policy: UrlPolicy,
    max_entries: AtomicUsize,
    in_flight: Mutex<HashMap<String, Gate>>,
}

impl FetchPipeline {
    pub fn new(
        store: Arc<RecordStore>, index: Arc<MemoryIndex>, fetcher: Arc<dyn Fetcher>, policy: UrlPolicy,
        max_entries: usize,
    ) -> Self {
        Self {
            store,
            index,
            fetcher,
            policy,
            max_entries: AtomicUsize::new(max_entries),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    pub fn index(&self) -> &Arc<MemoryIndex> {
        &self.index
    }

    pub fn policy(&self) -> &UrlPolicy {
        &self.policy
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries.load(Ordering::Relaxed)
    }

    /// Change the store bound. Takes effect at the next write.
    pub fn set_max_entries(&self, max_entries: usize) {
        self.max_entries.store(max_entries, Ordering::Relaxed);
    }

    /// Resolve `url` to a local handle, or `None` when it is not cacheable
    /// or cannot be retrieved.
    pub async fn resolve(&self, url: &str) -> Option<LocalHandle> {
        self.resolve_outcome(url).await.into_handle()
    }

    /// Resolve `url` and report which tier served it, or why it was not.
    pub async fn resolve_outcome(&self, url: &str) -> ResolveOutcome {
        let key = match self.policy.cache_key(url) {
            Ok(key) => key,
            Err(reason) => {
                tracing::debug!(url = %url, reason = %reason, "skipping non-cacheable url");
                return ResolveOutcome::Skipped(reason);
            }
        };

        if let Some(handle) = self.index.lookup(&key) {
            tracing::debug!(url = %key, "memory hit");
            return ResolveOutcome::Hit { handle, tier: Tier::Memory };
        }

        let gate = self.gate(&key).await;
        let outcome = {
            let _guard = gate.lock().await;
            self.populate(&key).await
        };
        self.release_gate(&key, gate).await;
        outcome
    }

    async fn populate(&self, key: &str) -> ResolveOutcome {
        // A resolve that held the gate before us may already have finished.
        if let Some(handle) = self.index.lookup(key) {
            tracing::debug!(url = %key, "memory hit after wait");
            return ResolveOutcome::Hit { handle, tier: Tier::Memory };
        }

        if let Some(record) = self.store.get(key).await {
            tracing::debug!(url = %key, size = record.size(), "store hit");
            let handle = self.index.materialize(key, Bytes::from(record.payload));
            return self.confirm(key, handle, Tier::Store).await;
        }

        let response = match self.fetcher.fetch(key).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(url = %key, error = %e, "fetch failed");
                return ResolveOutcome::Failed(FailureReason::Fetch(e));
            }
        };

        if self.store.put(key, &response.bytes).await.is_none() {
            return ResolveOutcome::Failed(FailureReason::NotPersisted);
        }
        eviction::enforce(&self.store, &self.index, self.max_entries()).await;

        tracing::debug!(url = %key, size = response.bytes.len(), fetch_ms = response.fetch_ms, "fetched and cached");
        let handle = self.index.materialize(key, response.bytes);
        self.confirm(key, handle, Tier::Network).await
    }

    /// Keep a freshly materialized handle only if its record is still stored.
    async fn confirm(&self, key: &str, handle: LocalHandle, tier: Tier) -> ResolveOutcome {
        if self.store.contains(key).await {
            return ResolveOutcome::Hit { handle, tier };
        }
        tracing::debug!(url = %key, "record evicted before handle was served");
        self.index.release(key);
        ResolveOutcome::Failed(FailureReason::Evicted)
    }

    async fn gate(&self, key: &str) -> Gate {
        let mut in_flight = self.in_flight.lock().await;
        Arc::clone(in_flight.entry(key.to_string()).or_default())
    }

    async fn release_gate(&self, key: &str, gate: Gate) {
        let mut in_flight = self.in_flight.lock().await;
        // The map and this caller hold the last two references.
        if Arc::strong_count(&gate) <= 2 {
            in_flight.remove(key);
        }
    }

    #[cfg(test)]
    async fn in_flight_len(&self) -> usize {
        self.in_flight.lock().await.len()
    }
}
