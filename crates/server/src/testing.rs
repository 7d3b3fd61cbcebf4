//! Scripted collaborators for engine tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{StatusCode, Url};
use serde_json::Value;

use favcache_client::{FavoritesSource, FetchResponse, Fetcher};
use favcache_core::Error;

/// Fetcher that serves canned bodies and counts every call.
///
/// URLs without a scripted body fail with `status 404`.
#[derive(Default)]
pub struct ScriptedFetcher {
    bodies: Mutex<HashMap<String, Bytes>>,
    failing: Mutex<Vec<String>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self { delay: Some(delay), ..Self::default() }
    }

    pub fn serve(self, url: &str, body: &'static [u8]) -> Self {
        self.bodies.lock().unwrap().insert(url.to_string(), Bytes::from_static(body));
        self
    }

    pub fn fail(self, url: &str) -> Self {
        self.failing.lock().unwrap().push(url.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.lock().unwrap().iter().any(|u| u == url) {
            return Err(Error::HttpError("status 500".into()));
        }
        let body = self.bodies.lock().unwrap().get(url).cloned();
        let body = body.ok_or_else(|| Error::HttpError("status 404".into()))?;

        let parsed = Url::parse(url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        Ok(FetchResponse {
            url: parsed.clone(),
            final_url: parsed,
            status: StatusCode::OK,
            content_type: Some("image/gif".into()),
            bytes: body,
            fetch_ms: 0,
        })
    }
}

/// Favorites source returning a fixed document.
pub struct StaticFavorites(pub Mutex<Value>);

impl StaticFavorites {
    pub fn new(document: Value) -> Self {
        Self(Mutex::new(document))
    }

    pub fn replace(&self, document: Value) {
        *self.0.lock().unwrap() = document;
    }
}

#[async_trait]
impl FavoritesSource for StaticFavorites {
    async fn read_favorites(&self) -> Result<Value, Error> {
        Ok(self.0.lock().unwrap().clone())
    }
}

/// `{"gifs": [{"src": ...}, ...]}` for the given URLs.
pub fn favorites_doc(urls: &[&str]) -> Value {
    let items: Vec<Value> = urls.iter().map(|u| serde_json::json!({ "src": u })).collect();
    serde_json::json!({ "gifs": items })
}

/// Engine over an in-memory store with no background work scheduled.
pub fn quiet_engine(fetcher: ScriptedFetcher, favorites: Value) -> crate::CacheEngine {
    let options = crate::EngineOptions {
        cache: favcache_core::CacheConfig { preload_on_startup: false, refresh_interval_minutes: 0, max_entries: 200 },
        ..crate::EngineOptions::default()
    };
    crate::CacheEngine::new(
        options,
        favcache_core::RecordStore::new(favcache_core::StoreLocation::InMemory),
        std::sync::Arc::new(fetcher),
        std::sync::Arc::new(StaticFavorites::new(favorites)),
    )
}

/// Parse the JSON text content of a tool result.
pub fn output_json(result: &rmcp::model::CallToolResult) -> Value {
    let content = serde_json::to_value(&result.content[0]).unwrap();
    let text = content
        .get("text")
        .and_then(|v| v.as_str())
        .expect("Expected text field in content");
    serde_json::from_str(text).unwrap()
}
