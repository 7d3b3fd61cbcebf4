//! Record CRUD operations.
//!
//! Provides functions for creating, reading, listing, and deleting cached
//! resource records. Records are keyed by normalized URL.

use super::connection::CacheDb;
use super::digest::payload_digest;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A cached resource.
///
/// `cached_at` is the wall-clock time (epoch millis) of the fetch that created
/// or last refreshed the record. `seq` increases with every write and orders
/// records that share a `cached_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    pub key: String,
    pub payload: Vec<u8>,
    pub digest: String,
    pub cached_at: i64,
    pub seq: i64,
}

impl CacheRecord {
    /// Payload size in bytes.
    pub fn size(&self) -> u64 {
        self.payload.len() as u64
    }
}

/// Record metadata without the payload, for scans and inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct EntryInfo {
    pub url: String,
    pub size: u64,
    pub digest: String,
    pub cached_at: i64,
    pub seq: i64,
}

impl CacheDb {
    /// Insert or overwrite the record for `key`.
    ///
    /// Stamps `cached_at` with the current time and assigns the next write
    /// sequence number. Returns the stored record.
    pub async fn upsert_record(&self, key: &str, payload: &[u8]) -> Result<CacheRecord, Error> {
        let key = key.to_string();
        let payload = payload.to_vec();
        let digest = payload_digest(&payload);
        let cached_at = chrono::Utc::now().timestamp_millis();

        self.conn
            .call(move |conn| -> Result<CacheRecord, Error> {
                let tx = conn.transaction()?;
                let seq: i64 = tx.query_row("SELECT COALESCE(MAX(seq), 0) + 1 FROM records", [], |row| row.get(0))?;
                tx.execute(
                    "INSERT INTO records (key, payload, size, digest, cached_at, seq)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                    ON CONFLICT(key) DO UPDATE SET
                        payload = excluded.payload,
                        size = excluded.size,
                        digest = excluded.digest,
                        cached_at = excluded.cached_at,
                        seq = excluded.seq",
                    params![&key, &payload, payload.len() as i64, &digest, cached_at, seq],
                )?;
                tx.commit()?;

                Ok(CacheRecord { key, payload, digest, cached_at, seq })
            })
            .await
            .map_err(Error::from)
    }

    /// Get a record by key.
    ///
    /// Returns None if the key doesn't exist in the cache.
    pub async fn get_record(&self, key: &str) -> Result<Option<CacheRecord>, Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<CacheRecord>, Error> {
                let mut stmt = conn.prepare("SELECT key, payload, digest, cached_at, seq FROM records WHERE key = ?1")?;

                let result = stmt.query_row(params![key], |row| {
                    Ok(CacheRecord {
                        key: row.get(0)?,
                        payload: row.get(1)?,
                        digest: row.get(2)?,
                        cached_at: row.get(3)?,
                        seq: row.get(4)?,
                    })
                });

                match result {
                    Ok(r) => Ok(Some(r)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Delete the record for `key`.
    ///
    /// Returns true if a record was removed.
    pub async fn delete_record(&self, key: &str) -> Result<bool, Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM records WHERE key = ?1", params![key])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// List record metadata, oldest first.
    pub async fn list_entries(&self) -> Result<Vec<EntryInfo>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<EntryInfo>, Error> {
                let mut stmt =
                    conn.prepare("SELECT key, size, digest, cached_at, seq FROM records ORDER BY cached_at, seq")?;
                let rows = stmt.query_map([], |row| {
                    Ok(EntryInfo {
                        url: row.get(0)?,
                        size: row.get::<_, i64>(1)? as u64,
                        digest: row.get(2)?,
                        cached_at: row.get(3)?,
                        seq: row.get(4)?,
                    })
                })?;

                rows.collect::<Result<Vec<_>, _>>().map_err(Error::from)
            })
            .await
            .map_err(Error::from)
    }

    /// Whether a record exists for `key`, without loading its payload.
    pub async fn has_record(&self, key: &str) -> Result<bool, Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let found = conn
                    .prepare("SELECT 1 FROM records WHERE key = ?1")?
                    .exists(params![key])?;
                Ok(found)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every record.
    ///
    /// Returns the number of deleted entries.
    pub async fn clear_records(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM records", [])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
