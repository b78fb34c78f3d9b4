// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;
use std::collections::BTreeMap;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    #[serde(default)]
    pub index: IndexConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

/// Index page configuration
#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    /// Directory holding the deployed `index.html`. Unset means no resources are available.
    #[serde(default)]
    pub resource_root: Option<String>,
    /// Exact request paths answered with the index page
    #[serde(default = "default_index_routes")]
    pub routes: Vec<String>,
    /// Answer unmatched paths with the index page instead of 404
    #[serde(default)]
    pub spa_fallback: bool,
    /// Handler init parameters, matched case-insensitively by name
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_index_routes() -> Vec<String> {
    vec!["/index.html".to_string()]
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            resource_root: None,
            routes: default_index_routes(),
            spa_fallback: false,
            params: BTreeMap::new(),
        }
    }
}
