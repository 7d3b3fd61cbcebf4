//! Favorites read from a JSON document on disk.

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;

use super::FavoritesSource;
use favcache_core::Error;

/// Favorites source backed by a JSON file the host keeps up to date.
///
/// A missing file reads as an empty document.
#[derive(Debug, Clone)]
pub struct JsonFileFavorites {
    path: PathBuf,
}

impl JsonFileFavorites {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl FavoritesSource for JsonFileFavorites {
    async fn read_favorites(&self) -> Result<Value, Error> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Value::Null),
            Err(e) => return Err(Error::FavoritesUnavailable(format!("{}: {e}", self.path.display()))),
        };

        serde_json::from_slice(&raw)
            .map_err(|e| Error::FavoritesUnavailable(format!("{}: {e}", self.path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::favorites::list_favorite_urls;

    #[tokio::test]
    async fn test_reads_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("favorites.json");
        tokio::fs::write(&path, r#"{"gifs":[{"src":"https://cdn.example.com/a.gif"}]}"#)
            .await
            .unwrap();

        let source = JsonFileFavorites::new(&path);
        assert_eq!(list_favorite_urls(&source).await, vec!["https://cdn.example.com/a.gif"]);
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let source = JsonFileFavorites::new(dir.path().join("absent.json"));
        assert_eq!(source.read_favorites().await.unwrap(), Value::Null);
        assert!(list_favorite_urls(&source).await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_json_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("favorites.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();

        let source = JsonFileFavorites::new(&path);
        assert!(matches!(source.read_favorites().await, Err(Error::FavoritesUnavailable(_))));
        assert!(list_favorite_urls(&source).await.is_empty());
    }
}
