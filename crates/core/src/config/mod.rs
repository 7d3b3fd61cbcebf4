//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (FAVCACHE_*)
//! 2. TOML config file (if FAVCACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// The cache settings the host exposes to the user.
///
/// This is the record the settings surface owns; the engine only reads it
/// and reacts when it is replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Resolve every favorite shortly after startup.
    #[serde(default = "default_true")]
    pub preload_on_startup: bool,

    /// Period of the background refresh, in minutes. `0` disables it.
    #[serde(default = "default_refresh_interval_minutes")]
    pub refresh_interval_minutes: u64,

    /// Maximum number of records kept in the persistent store.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            preload_on_startup: true,
            refresh_interval_minutes: default_refresh_interval_minutes(),
            max_entries: default_max_entries(),
        }
    }
}

impl CacheConfig {
    /// Refresh period, or `None` when the periodic refresh is disabled.
    pub fn refresh_interval(&self) -> Option<Duration> {
        match self.refresh_interval_minutes {
            0 => None,
            minutes => Some(Duration::from_secs(minutes * 60)),
        }
    }
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (FAVCACHE_*)
/// 2. TOML config file (if FAVCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite cache database.
    ///
    /// Set via FAVCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Path to the JSON document holding the host's favorites.
    ///
    /// Set via FAVCACHE_FAVORITES_PATH environment variable.
    #[serde(default = "default_favorites_path")]
    pub favorites_path: PathBuf,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via FAVCACHE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per resource.
    ///
    /// Set via FAVCACHE_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via FAVCACHE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum number of HTTP redirects followed per fetch.
    ///
    /// Set via FAVCACHE_MAX_REDIRECTS environment variable.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Number of URLs resolved concurrently during a batch.
    ///
    /// Set via FAVCACHE_BATCH_SIZE environment variable.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Delay before the startup preload, giving the host time to load favorites.
    ///
    /// Set via FAVCACHE_PRELOAD_DELAY_MS environment variable.
    #[serde(default = "default_preload_delay_ms")]
    pub preload_delay_ms: u64,

    /// Image-proxy hosts that refuse cross-origin retrieval and are never fetched.
    ///
    /// Set via FAVCACHE_BLOCKED_PROXY_DOMAINS environment variable (as an array, e.g. `[a.com,b.com]`).
    #[serde(default = "default_blocked_proxy_domains")]
    pub blocked_proxy_domains: Vec<String>,

    /// User-facing cache settings (FAVCACHE_CACHE__*).
    #[serde(default)]
    pub cache: CacheConfig,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./favcache.sqlite")
}

fn default_favorites_path() -> PathBuf {
    PathBuf::from("./favorites.json")
}

fn default_user_agent() -> String {
    "favcache/0.1".into()
}

fn default_max_bytes() -> usize {
    26_214_400 // 25MB
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_max_redirects() -> usize {
    5
}

fn default_batch_size() -> usize {
    4
}

fn default_preload_delay_ms() -> u64 {
    3_000
}

fn default_blocked_proxy_domains() -> Vec<String> {
    vec!["images-ext-1.discordapp.net".into(), "images-ext-2.discordapp.net".into()]
}

fn default_refresh_interval_minutes() -> u64 {
    30
}

fn default_max_entries() -> usize {
    200
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            favorites_path: default_favorites_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            max_redirects: default_max_redirects(),
            batch_size: default_batch_size(),
            preload_delay_ms: default_preload_delay_ms(),
            blocked_proxy_domains: default_blocked_proxy_domains(),
            cache: CacheConfig::default(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Startup preload delay as Duration.
    pub fn preload_delay(&self) -> Duration {
        Duration::from_millis(self.preload_delay_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `FAVCACHE_`
    /// 2. TOML file from `FAVCACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("FAVCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        Self::extract(figment.merge(Self::env_provider()))
    }

    /// Load configuration from a TOML string layered over the defaults.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        Self::extract(Figment::from(Serialized::defaults(Self::default())).merge(Toml::string(toml)))
    }

    fn env_provider() -> Env {
        Env::prefixed("FAVCACHE_")
            .ignore(&["CONFIG_FILE"])
            .map(|key| key.as_str().to_lowercase().into())
            .split("__")
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
