//! favcache server entry point.
//!
//! Boots the cache engine and serves the MCP management tools on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

use favcache_client::{FetchClient, FetchConfig, JsonFileFavorites};
use favcache_core::{AppConfig, RecordStore, StoreLocation};
use favcache_server::{CacheEngine, EngineOptions, FavcacheServer};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(
        db_path = %config.db_path.display(),
        favorites_path = %config.favorites_path.display(),
        "Starting favcache server on stdio transport"
    );

    let fetcher = FetchClient::new(FetchConfig::from(&config))?;
    let engine = Arc::new(CacheEngine::new(
        EngineOptions::from(&config),
        RecordStore::new(StoreLocation::File(config.db_path.clone())),
        Arc::new(fetcher),
        Arc::new(JsonFileFavorites::new(&config.favorites_path)),
    ));
    engine.start();

    let handler = FavcacheServer::new(Arc::clone(&engine));
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;
    engine.stop();

    Ok(())
}
