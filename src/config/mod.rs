//! Configuration module for floorwatch
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`FLOORWATCH_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use floorwatch::config::FloorwatchConfig;
//!
//! let config = FloorwatchConfig::default();
//! assert_eq!(config.backend.port, 3001);
//! assert_eq!(config.stream_url(), "http://localhost:3001/api/events");
//!
//! let toml = r#"
//! [backend]
//! api_base_url = "https://floor.example.com"
//! "#;
//! let config: FloorwatchConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.identity_url(), "https://floor.example.com/api/auth/me");
//! ```

pub mod backend;
pub mod error;
pub mod identity;
pub mod logging;
pub mod stream;

pub use backend::{BackendConfig, DEFAULT_BACKEND_PORT};
pub use error::ConfigError;
pub use identity::{parse_ttl_override, IdentityConfig, DEFAULT_IDENTITY_TTL_MS};
pub use logging::{LogFormat, LoggingConfig};
pub use stream::{StreamConfig, DEFAULT_EVENT_LOG_CAPACITY};

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Unified configuration for the floorwatch client runtime.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FloorwatchConfig {
    /// Where the backend lives
    pub backend: BackendConfig,
    /// Live event stream settings
    pub stream: StreamConfig,
    /// Identity lookup settings
    pub identity: IdentityConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl FloorwatchConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply `FLOORWATCH_*` environment variable overrides.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// Invalid values are silently ignored (current values are kept).
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base) = lookup("FLOORWATCH_API_BASE_URL") {
            if !base.trim().is_empty() {
                self.backend.api_base_url = Some(base);
            }
        }
        if let Some(host) = lookup("FLOORWATCH_BACKEND_HOST") {
            if !host.trim().is_empty() {
                self.backend.host = Some(host);
            }
        }
        if let Some(port) = lookup("FLOORWATCH_BACKEND_PORT") {
            if let Ok(p) = port.trim().parse() {
                self.backend.port = p;
            }
        }
        if let Some(protocol) = lookup("FLOORWATCH_BACKEND_PROTOCOL") {
            if !protocol.trim().is_empty() {
                self.backend.protocol = Some(protocol);
            }
        }

        if let Some(ttl) = lookup("FLOORWATCH_IDENTITY_TTL_MS") {
            if let Some(ms) = parse_ttl_override(&ttl) {
                self.identity.cache_ttl_ms = ms;
            }
        }

        if let Some(level) = lookup("FLOORWATCH_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("FLOORWATCH_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.port == 0 {
            return Err(ConfigError::invalid("backend.port", "port must be non-zero"));
        }
        if Url::parse(&self.backend.origin).is_err() {
            return Err(ConfigError::invalid(
                "backend.origin",
                format!("'{}' is not an absolute URL", self.backend.origin),
            ));
        }

        if self.stream.base_delay_ms == 0 {
            return Err(ConfigError::invalid(
                "stream.base_delay_ms",
                "base delay must be positive",
            ));
        }
        if self.stream.max_delay_ms < self.stream.base_delay_ms {
            return Err(ConfigError::invalid(
                "stream.max_delay_ms",
                "max delay must be at least the base delay",
            ));
        }
        if self.stream.event_log_capacity > DEFAULT_EVENT_LOG_CAPACITY {
            return Err(ConfigError::invalid(
                "stream.event_log_capacity",
                format!(
                    "event log holds at most {} entries",
                    DEFAULT_EVENT_LOG_CAPACITY
                ),
            ));
        }

        for (field, path) in [
            ("stream.path", &self.stream.path),
            ("identity.path", &self.identity.path),
        ] {
            if !path.starts_with('/') {
                return Err(ConfigError::invalid(field, "path must start with '/'"));
            }
        }

        if self.identity.token_key.trim().is_empty() {
            return Err(ConfigError::invalid(
                "identity.token_key",
                "token key cannot be empty",
            ));
        }

        Ok(())
    }

    /// Absolute URL of the live event stream.
    pub fn stream_url(&self) -> String {
        self.backend.endpoint(&self.stream.path)
    }

    /// Absolute URL of the identity endpoint.
    pub fn identity_url(&self) -> String {
        self.backend.endpoint(&self.identity.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::Path;

    fn overrides(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config = FloorwatchConfig::default();
        assert_eq!(config.backend.port, 3001);
        assert_eq!(config.stream.base_delay_ms, 2000);
        assert_eq!(config.identity.cache_ttl_ms, 60000);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_config_parse_minimal_toml() {
        let toml = r#"
        [backend]
        port = 4000
        "#;

        let config: FloorwatchConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.backend.port, 4000);
        assert_eq!(config.stream.path, "/api/events");
    }

    #[test]
    fn test_config_parse_example_file() {
        let toml = include_str!("../../floorwatch.example.toml");
        let config: FloorwatchConfig = toml::from_str(toml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.stream.max_delay_ms, 30000);
    }

    #[test]
    fn test_config_load_from_file() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "[identity]\ncache_ttl_ms = 1000").unwrap();

        let config = FloorwatchConfig::load(Some(temp.path())).unwrap();
        assert_eq!(config.identity.cache_ttl_ms, 1000);
    }

    #[test]
    fn test_config_missing_file_error() {
        let result = FloorwatchConfig::load(Some(Path::new("/nonexistent/floorwatch.toml")));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_config_invalid_toml_error() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "[backend\nport = ").unwrap();

        let result = FloorwatchConfig::load(Some(temp.path()));
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_config_load_none_returns_defaults() {
        let config = FloorwatchConfig::load(None).unwrap();
        assert_eq!(config.backend.port, 3001);
    }

    #[test]
    fn test_overrides_backend() {
        let config = FloorwatchConfig::default().with_overrides_from(overrides(&[
            ("FLOORWATCH_BACKEND_HOST", "10.1.2.3"),
            ("FLOORWATCH_BACKEND_PORT", "8080"),
            ("FLOORWATCH_BACKEND_PROTOCOL", "https"),
        ]));

        assert_eq!(config.backend.resolve_base_url(), "https://10.1.2.3:8080");
    }

    #[test]
    fn test_overrides_api_base() {
        let config = FloorwatchConfig::default().with_overrides_from(overrides(&[(
            "FLOORWATCH_API_BASE_URL",
            "https://api.plant.local",
        )]));

        assert_eq!(config.stream_url(), "https://api.plant.local/api/events");
    }

    #[test]
    fn test_overrides_invalid_values_ignored() {
        let config = FloorwatchConfig::default().with_overrides_from(overrides(&[
            ("FLOORWATCH_BACKEND_PORT", "not-a-number"),
            ("FLOORWATCH_IDENTITY_TTL_MS", "-1"),
            ("FLOORWATCH_LOG_FORMAT", "xml"),
        ]));

        assert_eq!(config.backend.port, 3001);
        assert_eq!(config.identity.cache_ttl_ms, DEFAULT_IDENTITY_TTL_MS);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_overrides_ttl_and_logging() {
        let config = FloorwatchConfig::default().with_overrides_from(overrides(&[
            ("FLOORWATCH_IDENTITY_TTL_MS", "1000"),
            ("FLOORWATCH_LOG_LEVEL", "debug"),
            ("FLOORWATCH_LOG_FORMAT", "json"),
        ]));

        assert_eq!(config.identity.cache_ttl_ms, 1000);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_config_env_override_port() {
        std::env::set_var("FLOORWATCH_BACKEND_PORT", "9999");
        let config = FloorwatchConfig::default().with_env_overrides();
        std::env::remove_var("FLOORWATCH_BACKEND_PORT");

        assert_eq!(config.backend.port, 9999);
    }

    #[test]
    fn test_validation_zero_port() {
        let mut config = FloorwatchConfig::default();
        config.backend.port = 0;

        let result = config.validate();
        assert!(matches!(
            result,
            Err(ConfigError::Validation { ref field, .. }) if field == "backend.port"
        ));
    }

    #[test]
    fn test_validation_event_log_capacity_above_hundred() {
        let config: FloorwatchConfig =
            toml::from_str("[stream]\nevent_log_capacity = 500").unwrap();
        match config.validate() {
            Err(ConfigError::Validation { field, .. }) => {
                assert_eq!(field, "stream.event_log_capacity")
            }
            other => panic!("expected capacity validation error, got {:?}", other),
        }

        let config: FloorwatchConfig =
            toml::from_str("[stream]\nevent_log_capacity = 25").unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_delays() {
        let mut config = FloorwatchConfig::default();
        config.stream.base_delay_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation { ref field, .. }) if field == "stream.base_delay_ms"
        ));

        config.stream.base_delay_ms = 5000;
        config.stream.max_delay_ms = 1000;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation { ref field, .. }) if field == "stream.max_delay_ms"
        ));
    }

    #[test]
    fn test_validation_relative_path() {
        let mut config = FloorwatchConfig::default();
        config.identity.path = "api/auth/me".to_string();

        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation { ref field, .. }) if field == "identity.path"
        ));
    }

    #[test]
    fn test_validation_bad_origin() {
        let mut config = FloorwatchConfig::default();
        config.backend.origin = "localhost".to_string();

        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation { ref field, .. }) if field == "backend.origin"
        ));
    }
}
