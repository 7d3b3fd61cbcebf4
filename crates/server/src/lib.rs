//! Caching engine and MCP management server for favcache.
//!
//! The engine sits between a host that renders remote animated images and
//! the network. It resolves each remote URL to a local handle, keeping the
//! payload in a memory index for the session and in a SQLite record store
//! across sessions, and keeps the host's favorites warm in the background.

pub mod engine;
pub mod eviction;
pub mod handler;
pub mod pipeline;
pub mod sync;
pub mod tools;

#[cfg(test)]
mod testing;

pub use engine::{CacheEngine, EngineOptions};
pub use handler::FavcacheServer;
pub use pipeline::{FailureReason, FetchPipeline, ResolveOutcome, Tier};
pub use sync::{BatchSummary, RefreshTimer, Synchronizer};
