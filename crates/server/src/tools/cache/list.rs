//! cache_list tool implementation.
//!
//! Lists stored records, oldest first.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use favcache_core::EntryInfo;

use crate::CacheEngine;
use crate::tools::json_result;

/// Parameters for the cache_list tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheListParams {
    /// Return at most this many entries (the newest are dropped first).
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Output from the cache_list tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheListOutput {
    /// Number of stored records.
    pub total: usize,
    /// Number of live memory handles.
    pub in_memory: usize,
    /// Stored records, oldest first.
    pub entries: Vec<EntryInfo>,
}

/// Implementation of the cache_list tool.
pub async fn list_impl(engine: &CacheEngine, params: CacheListParams) -> Result<CallToolResult, McpError> {
    let mut entries = engine.list_entries().await;
    let total = entries.len();
    if let Some(limit) = params.limit {
        entries.truncate(limit);
    }

    json_result(&CacheListOutput { total, in_memory: engine.memory_entries(), entries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedFetcher, favorites_doc, output_json, quiet_engine};

    const A: &str = "https://cdn.example.com/a.gif";
    const B: &str = "https://cdn.example.com/b.gif";

    #[tokio::test]
    async fn test_list_empty() {
        let engine = quiet_engine(ScriptedFetcher::new(), favorites_doc(&[]));
        let output = output_json(&list_impl(&engine, CacheListParams::default()).await.unwrap());
        assert_eq!(output["total"], 0);
        assert!(output["entries"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_entries_with_limit() {
        let engine = quiet_engine(ScriptedFetcher::new().serve(A, b"GIF89a").serve(B, b"b"), favorites_doc(&[]));
        engine.resolve(A).await.unwrap();
        engine.resolve(B).await.unwrap();

        let output = output_json(&list_impl(&engine, CacheListParams { limit: Some(1) }).await.unwrap());
        assert_eq!(output["total"], 2);
        assert_eq!(output["in_memory"], 2);
        let entries = output["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["url"], A);
        assert_eq!(entries[0]["size"], 6);
        assert_eq!(entries[0]["digest"].as_str().unwrap().len(), 64);
    }
}
