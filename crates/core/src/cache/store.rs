//! Lazily opened, failure-tolerant record store.
//!
//! `RecordStore` wraps [`CacheDb`] with the policy the engine needs from its
//! persistent tier: the database is opened on first use (concurrent first
//! calls share a single open), and every storage failure is logged and turned
//! into a miss or a no-op instead of being returned to the caller.

use std::path::PathBuf;

use tokio::sync::OnceCell;

use super::connection::CacheDb;
use super::records::{CacheRecord, EntryInfo};
use crate::Error;

/// Where the store keeps its records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// SQLite database file.
    File(PathBuf),
    /// Private in-memory database, lost when the store is dropped.
    InMemory,
}

/// Persistent tier of the cache.
#[derive(Debug)]
pub struct RecordStore {
    location: StoreLocation,
    db: OnceCell<CacheDb>,
}

impl RecordStore {
    /// Create a store that opens `location` on first use.
    pub fn new(location: StoreLocation) -> Self {
        Self { location, db: OnceCell::new() }
    }

    /// Open the database if needed.
    ///
    /// A failed open is not remembered, so the next call tries again.
    pub async fn open(&self) -> Result<&CacheDb, Error> {
        self.db
            .get_or_try_init(|| async {
                let db = match &self.location {
                    StoreLocation::File(path) => CacheDb::open(path).await?,
                    StoreLocation::InMemory => CacheDb::open_in_memory().await?,
                };
                tracing::debug!(location = ?self.location, "opened record store");
                Ok::<_, Error>(db)
            })
            .await
    }

    async fn db(&self) -> Option<&CacheDb> {
        match self.open().await {
            Ok(db) => Some(db),
            Err(e) => {
                tracing::warn!(location = ?self.location, error = %e, "record store unavailable");
                None
            }
        }
    }

    /// Look up the record for `url`. Storage failures count as a miss.
    pub async fn get(&self, url: &str) -> Option<CacheRecord> {
        let db = self.db().await?;
        match db.get_record(url).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "failed to read cached record");
                None
            }
        }
    }

    /// Insert or overwrite the record for `url`.
    ///
    /// Returns the stored record, or `None` when the write failed.
    pub async fn put(&self, url: &str, payload: &[u8]) -> Option<CacheRecord> {
        let db = self.db().await?;
        match db.upsert_record(url, payload).await {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "failed to write cached record");
                None
            }
        }
    }

    /// Remove the record for `url`. Returns true if one was removed.
    pub async fn delete(&self, url: &str) -> bool {
        let Some(db) = self.db().await else {
            return false;
        };
        match db.delete_record(url).await {
            Ok(deleted) => deleted,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "failed to delete cached record");
                false
            }
        }
    }

    /// Whether a record for `url` is stored. Storage failures count as absent.
    pub async fn contains(&self, url: &str) -> bool {
        let Some(db) = self.db().await else {
            return false;
        };
        db.has_record(url).await.unwrap_or_else(|e| {
            tracing::warn!(url = %url, error = %e, "failed to check cached record");
            false
        })
    }

    /// Full scan of record metadata, oldest first.
    pub async fn entries(&self) -> Vec<EntryInfo> {
        let Some(db) = self.db().await else {
            return Vec::new();
        };
        db.list_entries().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to list cached records");
            Vec::new()
        })
    }

    /// Remove every record. Returns the number removed.
    pub async fn clear(&self) -> u64 {
        let Some(db) = self.db().await else {
            return 0;
        };
        db.clear_records().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to clear cached records");
            0
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lazy_open_in_memory() {
        let store = RecordStore::new(StoreLocation::InMemory);
        assert!(store.get("https://cdn.example.com/a.gif").await.is_none());

        let record = store.put("https://cdn.example.com/a.gif", b"GIF89a").await.unwrap();
        assert_eq!(record.key, "https://cdn.example.com/a.gif");
        assert_eq!(store.get("https://cdn.example.com/a.gif").await.unwrap().payload, b"GIF89a");
    }

    #[tokio::test]
    async fn test_concurrent_open_is_shared() {
        let store = RecordStore::new(StoreLocation::InMemory);
        let (a, b) = tokio::join!(store.open(), store.open());
        let (a, b) = (a.unwrap(), b.unwrap());
        assert!(std::ptr::eq(a, b));

        store.put("https://cdn.example.com/a.gif", b"1").await.unwrap();
        assert_eq!(store.entries().await.len(), 1);
    }

    #[tokio::test]
    async fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.sqlite");

        let store = RecordStore::new(StoreLocation::File(path.clone()));
        store.put("https://cdn.example.com/a.gif", b"GIF89a").await.unwrap();
        drop(store);

        let reopened = RecordStore::new(StoreLocation::File(path));
        let record = reopened.get("https://cdn.example.com/a.gif").await.unwrap();
        assert_eq!(record.payload, b"GIF89a");
    }

    #[tokio::test]
    async fn test_unavailable_store_degrades_to_miss() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();

        let store = RecordStore::new(StoreLocation::File(blocker.join("cache.sqlite")));
        assert!(store.get("https://cdn.example.com/a.gif").await.is_none());
        assert!(store.put("https://cdn.example.com/a.gif", b"GIF89a").await.is_none());
        assert!(!store.delete("https://cdn.example.com/a.gif").await);
        assert!(!store.contains("https://cdn.example.com/a.gif").await);
        assert!(store.entries().await.is_empty());
        assert_eq!(store.clear().await, 0);
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let store = RecordStore::new(StoreLocation::InMemory);
        store.put("https://cdn.example.com/a.gif", b"a").await.unwrap();
        store.put("https://cdn.example.com/b.gif", b"b").await.unwrap();

        assert!(store.delete("https://cdn.example.com/a.gif").await);
        assert!(!store.delete("https://cdn.example.com/a.gif").await);
        assert!(!store.contains("https://cdn.example.com/a.gif").await);
        assert!(store.contains("https://cdn.example.com/b.gif").await);
        assert_eq!(store.clear().await, 1);
        assert!(store.entries().await.is_empty());
    }
}
