//! Client code for favcache.
//!
//! This crate provides the HTTP retrieval of remote resources, the URL
//! cacheability policy, and discovery of the host's favorites.

pub mod favorites;
pub mod fetch;

pub use favorites::{FavoritesSource, JsonFileFavorites, extract_urls, list_favorite_urls};
pub use fetch::{FetchClient, FetchConfig, FetchResponse, Fetcher, SkipReason, UrlPolicy, normalize};
