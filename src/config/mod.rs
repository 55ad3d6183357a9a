// Configuration module entry point
// Loads layered configuration and turns the http section into listener options

mod types;

use crate::adapter::{Error, ListenerOptions, SerializerEntry};
use crate::serializers;
use std::net::SocketAddr;

pub use types::{Config, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig};

impl Config {
    /// Load configuration from specified file path (without extension).
    /// Environment variables prefixed with `SERVER` override the file,
    /// e.g. `SERVER_HTTP__USE_ETAG=false`.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("SERVER").separator("__"))
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.backlog", 1024)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.max_body_size", 10_485_760)? // 10MB
            .set_default("http.end_response", true)?
            .set_default("http.use_compression", true)?
            .set_default("http.use_etag", true)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

impl HttpConfig {
    /// Listener options for the configured built-in serializers
    pub fn listener_options(&self) -> Result<ListenerOptions, Error> {
        let serializers = self
            .serializers
            .iter()
            .map(|media_type| {
                serializers::by_media_type(media_type)
                    .map(|entry| self.with_serializer_settings(media_type, entry))
                    .ok_or_else(|| {
                        Error::Configuration(format!("unknown serializer '{media_type}'"))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ListenerOptions {
            serializers: Some(serializers),
            settings: self.settings(),
            ..ListenerOptions::default()
        })
    }

    fn with_serializer_settings(
        &self,
        media_type: &str,
        entry: SerializerEntry,
    ) -> SerializerEntry {
        if media_type == "application/json" && self.pretty_json {
            entry.with_settings(serde_json::json!({ "pretty": true }))
        } else {
            entry
        }
    }
}
