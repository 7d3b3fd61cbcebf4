//! Size bound on the persistent store.
//!
//! After every successful write the store is trimmed back to `max_entries`
//! records. The oldest records go first, ordered by `(cached_at, seq)` so
//! records written within the same millisecond still evict in write order.

use favcache_core::{MemoryIndex, RecordStore};

/// Trim `store` down to `max_entries` records, releasing the index entry of
/// every evicted URL. Returns the evicted URLs, oldest first.
///
/// The index entry is released even when the store delete fails, so the
/// index never hands out a handle for a record it believes is gone.
pub async fn enforce(store: &RecordStore, index: &MemoryIndex, max_entries: usize) -> Vec<String> {
    let mut entries = store.entries().await;
    if entries.len() <= max_entries {
        return Vec::new();
    }

    entries.sort_by_key(|e| (e.cached_at, e.seq));
    let excess = entries.len() - max_entries;

    let mut evicted = Vec::with_capacity(excess);
    for entry in entries.into_iter().take(excess) {
        index.release(&entry.url);
        if !store.delete(&entry.url).await {
            tracing::warn!(url = %entry.url, "evicted record was not deleted");
        }
        evicted.push(entry.url);
    }

    tracing::info!(evicted = evicted.len(), max_entries, "evicted oldest cached records");
    evicted
}
