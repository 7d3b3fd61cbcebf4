//! cache_delete tool implementation.
//!
//! Removes one URL from both the memory index and the record store.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::CacheEngine;
use crate::tools::{json_result, require_url};

/// Parameters for the cache_delete tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheDeleteParams {
    /// URL of the entry to delete.
    pub url: String,
}

/// Output from the cache_delete tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheDeleteOutput {
    pub url: String,
    /// True if a stored record was removed.
    pub deleted: bool,
}

/// Implementation of the cache_delete tool.
pub async fn delete_impl(engine: &CacheEngine, params: CacheDeleteParams) -> Result<CallToolResult, McpError> {
    require_url(&params.url)?;
    let deleted = engine.delete_entry(&params.url).await;
    json_result(&CacheDeleteOutput { url: params.url, deleted })
}
