//! cache_read tool implementation.
//!
//! Dereferences a local handle so a consumer outside the process can use the
//! cached bytes.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use favcache_core::Error;

use crate::CacheEngine;
use crate::tools::json_result;

/// Parameters for the cache_read tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheReadParams {
    /// Local handle returned by cache_resolve or favorite_added.
    pub handle: String,
}

/// Output from the cache_read tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheReadOutput {
    pub handle: String,
    /// Remote URL the handle stands for.
    pub url: String,
    pub size: u64,
    /// Guessed from the URL path, `application/octet-stream` when unknown.
    pub content_type: String,
    /// Payload bytes, standard base64.
    pub data: String,
}

/// Implementation of the cache_read tool.
pub async fn read_impl(engine: &CacheEngine, params: CacheReadParams) -> Result<CallToolResult, McpError> {
    let handle = params.handle.trim();
    let Some(payload) = engine.payload(handle) else {
        return Err(Error::InvalidInput(format!("not a live handle: {handle}")).into());
    };
    let url = engine.reverse_resolve(handle);

    let path = url.split(['?', '#']).next().unwrap_or_default();
    let content_type = mime_guess::from_path(path).first_or_octet_stream().to_string();

    json_result(&CacheReadOutput {
        handle: handle.to_string(),
        url,
        size: payload.len() as u64,
        content_type,
        data: STANDARD.encode(&payload),
    })
}
