//! SQLite-backed persistent tier of the cache.
//!
//! This module provides durable storage for fetched resources using SQLite
//! with async access via tokio-rusqlite. It supports:
//!
//! - One record per normalized URL, with payload digest and fetch time
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Oldest-first scans for count-bounded eviction

pub mod connection;
pub mod digest;
pub mod migrations;
pub mod records;
pub mod store;

pub use crate::Error;

pub use connection::CacheDb;
pub use records::{CacheRecord, EntryInfo};
pub use store::{RecordStore, StoreLocation};
