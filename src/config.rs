//! Configuration Module
//!
//! Handles loading and managing proxy configuration from environment variables.

use std::env;
use std::path::PathBuf;

/// Proxy configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Origin that intercepted requests are forwarded to
    pub upstream_url: String,
    /// Name of the cache generation this process serves
    pub cache_version: String,
    /// Path of the shell document served to offline navigations
    pub shell_path: String,
    /// Directory holding the durable vault records
    pub data_dir: PathBuf,
    /// Largest request body the proxy will buffer
    pub max_body_bytes: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `UPSTREAM_URL` - Upstream origin (default: http://127.0.0.1:5173)
    /// - `CACHE_VERSION` - Cache generation name (default: pokevault-cache-v1)
    /// - `SHELL_PATH` - Fallback shell document (default: /index.html)
    /// - `DATA_DIR` - Vault record directory (default: ./pokevault-data)
    /// - `MAX_BODY_BYTES` - Request body limit (default: 10 MiB)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
            upstream_url: env::var("UPSTREAM_URL").unwrap_or(defaults.upstream_url),
            cache_version: env::var("CACHE_VERSION").unwrap_or(defaults.cache_version),
            shell_path: env::var("SHELL_PATH").unwrap_or(defaults.shell_path),
            data_dir: env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            max_body_bytes: env::var("MAX_BODY_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_body_bytes),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            upstream_url: "http://127.0.0.1:5173".to_string(),
            cache_version: "pokevault-cache-v1".to_string(),
            shell_path: "/index.html".to_string(),
            data_dir: PathBuf::from("./pokevault-data"),
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}
