//! Database connection management with pragma configuration.
//!
//! This module handles opening the SQLite database, applying required pragmas
//! for performance and concurrency (WAL mode), and running migrations.

use super::migrations;
use crate::Error;
use std::path::Path;
use tokio_rusqlite::Connection;

// busy_timeout goes first so a concurrent opener waits out the WAL switch.
const PRAGMAS: &str = "PRAGMA busy_timeout=5000;
     PRAGMA journal_mode=WAL;
     PRAGMA synchronous=NORMAL;
     PRAGMA temp_store=MEMORY;";

/// Cache database handle.
///
/// Wraps a tokio-rusqlite Connection that runs database operations
/// on a background thread.
#[derive(Clone, Debug)]
pub struct CacheDb {
    pub(crate) conn: Connection,
}

impl CacheDb {
    /// Open a database at the specified path.
    ///
    /// Creates the file (and its parent directory) if it doesn't exist,
    /// applies performance pragmas, and runs any pending migrations.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let conn = Connection::open(path).await.map_err(|e| Error::Database(e.into()))?;
        Self::prepare(conn).await
    }

    /// Open an in-memory database for testing.
    ///
    /// Creates a temporary in-memory SQLite database with the same
    /// pragma configuration as file-based databases.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| Error::Database(e.into()))?;
        Self::prepare(conn).await
    }

    async fn prepare(conn: Connection) -> Result<Self, Error> {
        conn.call(|conn| {
            conn.execute_batch(PRAGMAS)?;
            Ok(())
        })
        .await
        .map_err(Error::Database)?;

        migrations::run(&conn).await?;

        Ok(Self { conn })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_in_memory() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let version = db
            .conn
            .call(|conn| conn.query_row("SELECT sqlite_version()", [], |row| row.get::<_, String>(0)))
            .await
            .unwrap();
        assert!(!version.is_empty());
    }

    #[tokio::test]
    async fn test_open_file_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cache.sqlite");

        let _db = CacheDb::open(&path).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_concurrent_opens_share_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.sqlite");

        let (a, b) = tokio::join!(CacheDb::open(&path), CacheDb::open(&path));
        assert!(a.is_ok());
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_busy_timeout_set_before_journal_mode() {
        let first = PRAGMAS.split(';').next().unwrap().trim();
        assert_eq!(first, "PRAGMA busy_timeout=5000");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.sqlite");
        let (a, b, c, d) = tokio::join!(
            CacheDb::open(&path),
            CacheDb::open(&path),
            CacheDb::open(&path),
            CacheDb::open(&path)
        );
        for db in [a, b, c, d] {
            let db = db.unwrap();
            let (timeout, mode) = db
                .conn
                .call(|conn| -> Result<(i64, String), tokio_rusqlite::rusqlite::Error> {
                    let timeout: i64 = conn.query_row("PRAGMA busy_timeout", [], |row| row.get(0))?;
                    let mode: String = conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))?;
                    Ok((timeout, mode))
                })
                .await
                .unwrap();
            assert_eq!(timeout, 5000);
            assert_eq!(mode, "wal");
        }
    }
}
