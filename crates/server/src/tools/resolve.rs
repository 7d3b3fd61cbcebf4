//! cache_resolve and cache_unresolve tool implementations.
//!
//! The two boundary lookups: remote URL to local handle when rendering, and
//! local handle back to remote URL when persisting.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{json_result, require_url};
use crate::CacheEngine;

fn default_true() -> bool {
    true
}

/// Parameters for the cache_resolve tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheResolveParams {
    /// Remote URL to resolve.
    pub url: String,

    /// Wait for store or network retrieval (default: true). When false, only
    /// the memory index is consulted and a miss starts a background resolve.
    #[serde(default = "default_true")]
    pub wait: bool,
}

/// Output from the cache_resolve tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheResolveOutput {
    /// The URL as given.
    pub url: String,
    /// Local handle, or the URL unchanged when nothing is cached.
    pub value: String,
    /// True if `value` is a local handle.
    pub cached: bool,
}

/// Implementation of the cache_resolve tool.
pub async fn resolve_impl(engine: &CacheEngine, params: CacheResolveParams) -> Result<CallToolResult, McpError> {
    require_url(&params.url)?;

    let handle = if params.wait { engine.resolve(&params.url).await } else { engine.lookup_or_warm(&params.url) };
    let cached = handle.is_some();
    let value = handle.map_or_else(|| params.url.clone(), |h| h.into_string());
    json_result(&CacheResolveOutput { url: params.url, value, cached })
}

/// Parameters for the cache_unresolve tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheUnresolveParams {
    /// Local handle (or any other string) to map back.
    pub value: String,
}

/// Output from the cache_unresolve tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheUnresolveOutput {
    /// The value as given.
    pub value: String,
    /// Original URL, or the value unchanged when it is not a live handle.
    pub url: String,
    /// True if `value` was a live handle.
    pub matched: bool,
}

/// Implementation of the cache_unresolve tool.
pub async fn unresolve_impl(engine: &CacheEngine, params: CacheUnresolveParams) -> Result<CallToolResult, McpError> {
    let url = engine.reverse_resolve(&params.value);
    let matched = url != params.value;
    json_result(&CacheUnresolveOutput { value: params.value, url, matched })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedFetcher, favorites_doc, output_json, quiet_engine};

    const A: &str = "https://cdn.example.com/a.gif";

    #[tokio::test]
    async fn test_resolve_then_unresolve() {
        let engine = quiet_engine(ScriptedFetcher::new().serve(A, b"GIF89a"), favorites_doc(&[]));

        let result = resolve_impl(&engine, CacheResolveParams { url: A.into(), wait: true }).await.unwrap();
        let output = output_json(&result);
        assert_eq!(output["cached"], true);
        let handle = output["value"].as_str().unwrap().to_string();
        assert!(handle.starts_with("blob:favcache/"));

        let result = unresolve_impl(&engine, CacheUnresolveParams { value: handle }).await.unwrap();
        let output = output_json(&result);
        assert_eq!(output["url"], A);
        assert_eq!(output["matched"], true);
    }

    #[tokio::test]
    async fn test_resolve_failure_returns_url_unchanged() {
        let engine = quiet_engine(ScriptedFetcher::new().fail(A), favorites_doc(&[]));

        let result = resolve_impl(&engine, CacheResolveParams { url: A.into(), wait: true }).await.unwrap();
        let output = output_json(&result);
        assert_eq!(output["value"], A);
        assert_eq!(output["cached"], false);
    }

    #[tokio::test]
    async fn test_resolve_without_wait_on_miss() {
        let engine = quiet_engine(ScriptedFetcher::new().serve(A, b"GIF89a"), favorites_doc(&[]));

        let result = resolve_impl(&engine, CacheResolveParams { url: A.into(), wait: false }).await.unwrap();
        assert_eq!(output_json(&result)["cached"], false);
    }

    #[tokio::test]
    async fn test_resolve_of_handle_is_not_cached() {
        let engine = quiet_engine(ScriptedFetcher::new().serve(A, b"GIF89a"), favorites_doc(&[]));
        let handle = engine.resolve(A).await.unwrap().into_string();

        for wait in [true, false] {
            let result = resolve_impl(&engine, CacheResolveParams { url: handle.clone(), wait }).await.unwrap();
            let output = output_json(&result);
            assert_eq!(output["value"], handle.as_str());
            assert_eq!(output["cached"], false);
        }
    }

    #[tokio::test]
    async fn test_resolve_without_wait_on_hit() {
        let engine = quiet_engine(ScriptedFetcher::new().serve(A, b"GIF89a"), favorites_doc(&[]));
        let handle = engine.resolve(A).await.unwrap();

        let result = resolve_impl(&engine, CacheResolveParams { url: A.into(), wait: false }).await.unwrap();
        let output = output_json(&result);
        assert_eq!(output["cached"], true);
        assert_eq!(output["value"], handle.as_str());
    }

    #[tokio::test]
    async fn test_resolve_empty_url_is_invalid() {
        let engine = quiet_engine(ScriptedFetcher::new(), favorites_doc(&[]));
        let result = resolve_impl(&engine, CacheResolveParams { url: "  ".into(), wait: true }).await;
        assert_eq!(result.unwrap_err().code.0, -32602);
    }

    #[tokio::test]
    async fn test_unresolve_unknown_value() {
        let engine = quiet_engine(ScriptedFetcher::new(), favorites_doc(&[]));
        let result = unresolve_impl(&engine, CacheUnresolveParams { value: A.into() }).await.unwrap();
        let output = output_json(&result);
        assert_eq!(output["url"], A);
        assert_eq!(output["matched"], false);
    }
}
