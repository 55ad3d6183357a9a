// Configuration types

use crate::adapter::Settings;
use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    /// Listen backlog passed to `listen(2)`
    #[serde(default = "default_backlog")]
    pub backlog: i32,
}

#[allow(clippy::missing_const_for_fn)]
fn default_backlog() -> i32 {
    1024
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

/// HTTP adapter configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub max_body_size: u64,
    /// End the transport response inside the adapter
    pub end_response: bool,
    pub use_compression: bool,
    pub use_etag: bool,
    /// Built-in serializers to register, in priority order
    #[serde(default = "default_serializers")]
    pub serializers: Vec<String>,
    /// Pretty-print JSON responses
    #[serde(default)]
    pub pretty_json: bool,
}

impl HttpConfig {
    pub const fn settings(&self) -> Settings {
        Settings {
            end_response: self.end_response,
            use_compression: self.use_compression,
            use_etag: self.use_etag,
        }
    }
}

fn default_serializers() -> Vec<String> {
    [
        "application/json",
        "text/html",
        "multipart/form-data",
        "application/x-www-form-urlencoded",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
