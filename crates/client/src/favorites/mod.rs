//! Discovery of the URLs the user has marked as favorites.
//!
//! The favorites list is owned by the host application. This module only
//! reads it, through [`FavoritesSource`], and extracts one URL per item.
//! Accepted document shapes:
//!
//! - `{ "gifs": { "<key>": { "src": "<url>", ... } } }` (the key is used when `src` is absent)
//! - `{ "gifs": [ { "src": "<url>" }, "<url>" ] }`
//! - `[ { "src": "<url>" }, "<url>" ]`
//!
//! Anything else yields no URLs.

mod file;

use async_trait::async_trait;
use serde_json::Value;

use favcache_core::Error;

pub use file::JsonFileFavorites;

/// Field holding an item's source URL.
const SOURCE_FIELD: &str = "src";

/// Read access to the host's favorites.
#[async_trait]
pub trait FavoritesSource: Send + Sync {
    /// Read the current favorites document.
    async fn read_favorites(&self) -> Result<Value, Error>;
}

/// Read `source` and return one URL per favorite, in source order.
///
/// Read failures and malformed documents are logged and yield an empty list.
pub async fn list_favorite_urls(source: &dyn FavoritesSource) -> Vec<String> {
    match source.read_favorites().await {
        Ok(document) => {
            let urls = extract_urls(&document);
            tracing::debug!(count = urls.len(), "discovered favorites");
            urls
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to read favorites; treating as empty");
            Vec::new()
        }
    }
}

/// Extract favorite URLs from a favorites document.
pub fn extract_urls(document: &Value) -> Vec<String> {
    let items = match document {
        Value::Object(map) => match map.get("gifs") {
            Some(items) => items,
            None => {
                tracing::warn!("favorites document has no `gifs` field");
                return Vec::new();
            }
        },
        Value::Array(_) => document,
        Value::Null => return Vec::new(),
        _ => {
            tracing::warn!("favorites document is not an object or array");
            return Vec::new();
        }
    };

    match items {
        Value::Object(map) => map
            .iter()
            .filter_map(|(key, item)| item_url(item).or_else(|| non_empty(key)))
            .collect(),
        Value::Array(list) => list.iter().filter_map(item_url).collect(),
        Value::Null => Vec::new(),
        _ => {
            tracing::warn!("favorites `gifs` field is not an object or array");
            Vec::new()
        }
    }
}

fn item_url(item: &Value) -> Option<String> {
    match item {
        Value::String(url) => non_empty(url),
        Value::Object(fields) => fields.get(SOURCE_FIELD).and_then(Value::as_str).and_then(non_empty),
        _ => None,
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
