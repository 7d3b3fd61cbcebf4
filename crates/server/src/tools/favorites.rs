//! favorite_added and favorites_changed tool implementations.
//!
//! Notifications from the host that its favorites list changed.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{json_result, require_url};
use crate::CacheEngine;

/// Parameters for the favorite_added tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FavoriteAddedParams {
    /// Source URL of the favorite that was just added.
    pub url: String,
}

/// Output from the favorite_added tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FavoriteAddedOutput {
    pub url: String,
    /// Local handle, absent when the URL is not cacheable or not retrievable.
    pub handle: Option<String>,
}

/// Implementation of the favorite_added tool.
pub async fn favorite_added_impl(
    engine: &CacheEngine, params: FavoriteAddedParams,
) -> Result<CallToolResult, McpError> {
    require_url(&params.url)?;
    let handle = engine
        .on_favorite_added(&params.url)
        .await
        .map(|h| h.into_string());
    json_result(&FavoriteAddedOutput { url: params.url, handle })
}

/// Parameters for the favorites_changed tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct FavoritesChangedParams {
    /// Resolve every favorite, including those already held in memory.
    #[serde(default)]
    pub full: bool,
}

/// Implementation of the favorites_changed tool.
///
/// Returns the batch summary of the resolves it ran.
pub async fn favorites_changed_impl(
    engine: &CacheEngine, params: FavoritesChangedParams,
) -> Result<CallToolResult, McpError> {
    let summary = if params.full { engine.preload_all().await } else { engine.on_favorites_changed().await };
    json_result(&summary)
}
