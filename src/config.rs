//! Configuration Module
//!
//! Handles loading and managing engine configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Engine and server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether generated documents are cached on disk
    pub cache_enabled: bool,
    /// Directory holding cache blobs and the cache index
    pub cache_dir: PathBuf,
    /// Maximum total size of cached content in megabytes
    pub cache_max_size_mb: u64,
    /// Default TTL in seconds for cached documents
    pub default_ttl: u64,
    /// JSON file holding named themes
    pub themes_path: PathBuf,
    /// Directory generated documents are written to by the HTTP API
    pub output_dir: PathBuf,
    /// HTTP server port
    pub server_port: u16,
    /// Background cleanup interval in seconds, 0 disables the task
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_ENABLED` - Enable the result cache (default: true)
    /// - `CACHE_DIR` - Cache directory (default: ./data/cache)
    /// - `CACHE_MAX_SIZE_MB` - Cache size limit in MB (default: 100)
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 3600)
    /// - `THEMES_PATH` - Theme file (default: ./data/config/themes.json)
    /// - `OUTPUT_DIR` - Output directory (default: ./output)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 0, disabled)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_enabled: parse_var("CACHE_ENABLED").unwrap_or(defaults.cache_enabled),
            cache_dir: env::var("CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            cache_max_size_mb: parse_var("CACHE_MAX_SIZE_MB").unwrap_or(defaults.cache_max_size_mb),
            default_ttl: parse_var("DEFAULT_TTL").unwrap_or(defaults.default_ttl),
            themes_path: env::var("THEMES_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.themes_path),
            output_dir: env::var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            cleanup_interval: parse_var("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
        }
    }

    /// Cache size limit in bytes.
    pub fn cache_max_size_bytes(&self) -> u64 {
        self.cache_max_size_mb * 1024 * 1024
    }

    /// Default cache TTL as a Duration.
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            cache_dir: PathBuf::from("./data/cache"),
            cache_max_size_mb: 100,
            default_ttl: 3600,
            themes_path: PathBuf::from("./data/config/themes.json"),
            output_dir: PathBuf::from("./output"),
            server_port: 3000,
            cleanup_interval: 0,
        }
    }
}
