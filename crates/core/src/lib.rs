//! Core types and shared functionality for favcache.
//!
//! This crate provides:
//! - Persistent record store with SQLite backend
//! - In-memory handle index
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod index;

pub use cache::{CacheDb, CacheRecord, EntryInfo, RecordStore, StoreLocation};
pub use config::{AppConfig, CacheConfig, ConfigError};
pub use error::Error;
pub use index::{LocalHandle, MemoryHandle, MemoryIndex};
