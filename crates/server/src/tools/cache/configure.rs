//! cache_configure tool implementation.
//!
//! Replaces cache settings at runtime. Omitted fields keep their current value.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use favcache_core::{CacheConfig, Error};

use crate::CacheEngine;
use crate::tools::json_result;

/// Parameters for the cache_configure tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheConfigureParams {
    /// Resolve every favorite shortly after startup.
    #[serde(default)]
    pub preload_on_startup: Option<bool>,

    /// Period of the background refresh in minutes; 0 disables it.
    #[serde(default)]
    pub refresh_interval_minutes: Option<u64>,

    /// Maximum number of stored records (at least 1).
    #[serde(default)]
    pub max_entries: Option<usize>,
}

/// Output from the cache_configure tool: the settings now in effect.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheConfigureOutput {
    pub preload_on_startup: bool,
    pub refresh_interval_minutes: u64,
    pub max_entries: usize,
    /// True if the periodic refresh is scheduled.
    pub refresh_active: bool,
}

/// Implementation of the cache_configure tool.
pub async fn configure_impl(engine: &CacheEngine, params: CacheConfigureParams) -> Result<CallToolResult, McpError> {
    let current = engine.config();
    let config = CacheConfig {
        preload_on_startup: params.preload_on_startup.unwrap_or(current.preload_on_startup),
        refresh_interval_minutes: params.refresh_interval_minutes.unwrap_or(current.refresh_interval_minutes),
        max_entries: params.max_entries.unwrap_or(current.max_entries),
    };

    engine
        .update_config(config)
        .await
        .map_err(|e| Error::InvalidInput(e.to_string()))?;

    json_result(&CacheConfigureOutput {
        preload_on_startup: config.preload_on_startup,
        refresh_interval_minutes: config.refresh_interval_minutes,
        max_entries: config.max_entries,
        refresh_active: engine.refresh_period().is_some(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedFetcher, favorites_doc, output_json, quiet_engine};

    #[tokio::test]
    async fn test_configure_partial_update() {
        let engine = quiet_engine(ScriptedFetcher::new(), favorites_doc(&[]));

        let params = CacheConfigureParams { refresh_interval_minutes: Some(5), ..Default::default() };
        let output = output_json(&configure_impl(&engine, params).await.unwrap());
        assert_eq!(output["refresh_interval_minutes"], 5);
        assert_eq!(output["max_entries"], 200);
        assert_eq!(output["refresh_active"], true);

        let params = CacheConfigureParams { refresh_interval_minutes: Some(0), ..Default::default() };
        let output = output_json(&configure_impl(&engine, params).await.unwrap());
        assert_eq!(output["refresh_active"], false);
    }

    #[tokio::test]
    async fn test_configure_rejects_zero_entries() {
        let engine = quiet_engine(ScriptedFetcher::new(), favorites_doc(&[]));

        let params = CacheConfigureParams { max_entries: Some(0), ..Default::default() };
        let err = configure_impl(&engine, params).await.unwrap_err();
        assert_eq!(err.code.0, -32602);
        assert_eq!(engine.config().max_entries, 200);
    }
}
