//! Cache-related MCP tools.
//!
//! This module provides tools for inspecting and managing the cache.

pub mod clear;
pub mod configure;
pub mod delete;
pub mod list;
pub mod read;

pub use clear::{CacheClearParams, clear_impl};
pub use configure::{CacheConfigureParams, configure_impl};
pub use delete::{CacheDeleteParams, delete_impl};
pub use list::{CacheListParams, list_impl};
pub use read::{CacheReadParams, read_impl};
