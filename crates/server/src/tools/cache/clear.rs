//! cache_clear tool implementation.
//!
//! Empties both tiers of the cache.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use favcache_core::Error;

use crate::CacheEngine;
use crate::tools::json_result;

/// Parameters for the cache_clear tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheClearParams {
    /// Must be true; guards against clearing by accident.
    #[serde(default)]
    pub confirm: bool,
}

/// Output from the cache_clear tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheClearOutput {
    /// Number of stored records deleted.
    pub deleted: u64,
}

/// Implementation of the cache_clear tool.
pub async fn clear_impl(engine: &CacheEngine, params: CacheClearParams) -> Result<CallToolResult, McpError> {
    if !params.confirm {
        return Err(Error::InvalidInput("confirm must be true to clear the cache".to_string()).into());
    }

    let deleted = engine.clear_all().await;
    json_result(&CacheClearOutput { deleted })
}
