//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.

use std::sync::Arc;

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

use crate::CacheEngine;
use crate::tools::{
    CacheClearParams, CacheConfigureParams, CacheDeleteParams, CacheListParams, CacheReadParams, CacheResolveParams,
    CacheUnresolveParams, FavoriteAddedParams, FavoritesChangedParams, cache, favorites, resolve,
};

/// The main MCP server handler for favcache.
#[derive(Clone)]
pub struct FavcacheServer {
    engine: Arc<CacheEngine>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl FavcacheServer {
    /// Create a new server handler over a running engine.
    pub fn new(engine: Arc<CacheEngine>) -> Self {
        Self { engine, tool_router: Self::tool_router() }
    }

    pub fn engine(&self) -> &Arc<CacheEngine> {
        &self.engine
    }

    #[tool(
        description = "Resolve a remote image URL to a local cached handle. Fetches and stores it on a miss unless wait is false. Returns the URL unchanged when it cannot be cached."
    )]
    async fn cache_resolve(&self, params: Parameters<CacheResolveParams>) -> Result<CallToolResult, McpError> {
        resolve::resolve_impl(&self.engine, params.0).await
    }

    #[tool(description = "Map a local cached handle back to the remote URL it stands for.")]
    async fn cache_unresolve(&self, params: Parameters<CacheUnresolveParams>) -> Result<CallToolResult, McpError> {
        resolve::unresolve_impl(&self.engine, params.0).await
    }

    #[tool(
        description = "Read the cached bytes behind a local handle. Returns the source URL, size, content type and base64 data."
    )]
    async fn cache_read(&self, params: Parameters<CacheReadParams>) -> Result<CallToolResult, McpError> {
        cache::read_impl(&self.engine, params.0).await
    }

    #[tool(description = "List stored cache entries (url, size, digest, cached_at), oldest first.")]
    async fn cache_list(&self, params: Parameters<CacheListParams>) -> Result<CallToolResult, McpError> {
        cache::list_impl(&self.engine, params.0).await
    }

    #[tool(description = "Delete one URL from the cache.")]
    async fn cache_delete(&self, params: Parameters<CacheDeleteParams>) -> Result<CallToolResult, McpError> {
        cache::delete_impl(&self.engine, params.0).await
    }

    #[tool(description = "Delete every cache entry. Requires confirm: true.")]
    async fn cache_clear(&self, params: Parameters<CacheClearParams>) -> Result<CallToolResult, McpError> {
        cache::clear_impl(&self.engine, params.0).await
    }

    #[tool(description = "Update cache settings: preload_on_startup, refresh_interval_minutes (0 disables), max_entries.")]
    async fn cache_configure(&self, params: Parameters<CacheConfigureParams>) -> Result<CallToolResult, McpError> {
        cache::configure_impl(&self.engine, params.0).await
    }

    #[tool(description = "Notify that a favorite was added. Caches its URL immediately and returns the handle.")]
    async fn favorite_added(&self, params: Parameters<FavoriteAddedParams>) -> Result<CallToolResult, McpError> {
        favorites::favorite_added_impl(&self.engine, params.0).await
    }

    #[tool(
        description = "Notify that the favorites list changed. Caches favorites not yet held in memory (all of them with full: true) and returns a batch summary."
    )]
    async fn favorites_changed(&self, params: Parameters<FavoritesChangedParams>) -> Result<CallToolResult, McpError> {
        favorites::favorites_changed_impl(&self.engine, params.0).await
    }
}

impl ServerHandler for FavcacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "favcache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedFetcher, favorites_doc, quiet_engine};

    #[test]
    fn test_all_tools_registered() {
        let server = FavcacheServer::new(Arc::new(quiet_engine(ScriptedFetcher::new(), favorites_doc(&[]))));

        let mut names: Vec<String> = server
            .tool_router
            .list_all()
            .into_iter()
            .map(|t| t.name.to_string())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "cache_clear",
                "cache_configure",
                "cache_delete",
                "cache_list",
                "cache_read",
                "cache_resolve",
                "cache_unresolve",
                "favorite_added",
                "favorites_changed",
            ]
        );
    }

    #[test]
    fn test_server_info() {
        let server = FavcacheServer::new(Arc::new(quiet_engine(ScriptedFetcher::new(), favorites_doc(&[]))));
        let info = server.get_info();
        assert_eq!(info.server_info.name, "favcache");
        assert!(info.capabilities.tools.is_some());
    }
}
