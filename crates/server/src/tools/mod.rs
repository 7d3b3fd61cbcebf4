//! MCP tool implementations.
//!
//! This module contains all tools exposed by the favcache server. Every tool
//! returns its output as pretty JSON text content.

pub mod cache;
pub mod favorites;
pub mod resolve;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

use favcache_core::Error;

pub use cache::{CacheClearParams, CacheConfigureParams, CacheDeleteParams, CacheListParams, CacheReadParams};
pub use favorites::{FavoriteAddedParams, FavoritesChangedParams};
pub use resolve::{CacheResolveParams, CacheUnresolveParams};

fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

fn require_url(url: &str) -> Result<(), McpError> {
    if url.trim().is_empty() {
        return Err(Error::InvalidInput("url must not be empty".to_string()).into());
    }
    Ok(())
}
