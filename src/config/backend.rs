//! Backend endpoint configuration

use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Default port the dashboard backend listens on.
pub const DEFAULT_BACKEND_PORT: u16 = 3001;

/// Where the REST/SSE backend lives.
///
/// `api_base_url` wins when set. Otherwise the base is assembled from
/// `protocol`, `host` and `port`, with protocol and host falling back to the
/// page `origin`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,
    pub origin: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    pub port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_base_url: None,
            origin: "http://localhost".to_string(),
            host: None,
            port: DEFAULT_BACKEND_PORT,
            protocol: None,
        }
    }
}

impl BackendConfig {
    /// Resolve the API base URL, without a trailing slash.
    pub fn resolve_base_url(&self) -> String {
        if let Some(base) = self.api_base_url.as_deref().map(str::trim) {
            if !base.is_empty() {
                return base.trim_end_matches('/').to_string();
            }
        }

        let origin = Url::parse(&self.origin).ok();

        let protocol = self
            .protocol
            .as_deref()
            .map(|p| p.trim_end_matches(':').to_string())
            .filter(|p| !p.is_empty())
            .or_else(|| origin.as_ref().map(|o| o.scheme().to_string()))
            .unwrap_or_else(|| "http".to_string());

        let host = self
            .host
            .clone()
            .filter(|h| !h.trim().is_empty())
            .or_else(|| origin.as_ref().and_then(|o| o.host_str().map(String::from)))
            .unwrap_or_else(|| "localhost".to_string());

        format!("{}://{}:{}", protocol, host, self.port)
    }

    /// Join a path onto the resolved base URL.
    pub fn endpoint(&self, path: &str) -> String {
        let base = self.resolve_base_url();
        if path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_config_defaults() {
        let config = BackendConfig::default();
        assert_eq!(config.port, 3001);
        assert_eq!(config.origin, "http://localhost");
        assert!(config.api_base_url.is_none());
    }

    #[test]
    fn test_resolve_from_origin() {
        let config = BackendConfig {
            origin: "https://floor.example.com".to_string(),
            ..Default::default()
        };
        assert_eq!(config.resolve_base_url(), "https://floor.example.com:3001");
    }

    #[test]
    fn test_resolve_explicit_host_and_protocol() {
        let config = BackendConfig {
            host: Some("10.0.0.5".to_string()),
            protocol: Some("https:".to_string()),
            port: 8443,
            ..Default::default()
        };
        assert_eq!(config.resolve_base_url(), "https://10.0.0.5:8443");
    }

    #[test]
    fn test_api_base_override_wins() {
        let config = BackendConfig {
            api_base_url: Some("https://api.example.com/".to_string()),
            host: Some("ignored".to_string()),
            ..Default::default()
        };
        assert_eq!(config.resolve_base_url(), "https://api.example.com");
    }

    #[test]
    fn test_blank_api_base_is_ignored() {
        let config = BackendConfig {
            api_base_url: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(config.resolve_base_url(), "http://localhost:3001");
    }

    #[test]
    fn test_unparseable_origin_falls_back() {
        let config = BackendConfig {
            origin: "not a url".to_string(),
            ..Default::default()
        };
        assert_eq!(config.resolve_base_url(), "http://localhost:3001");
    }

    #[test]
    fn test_endpoint_join() {
        let config = BackendConfig::default();
        assert_eq!(
            config.endpoint("/api/events"),
            "http://localhost:3001/api/events"
        );
        assert_eq!(
            config.endpoint("api/auth/me"),
            "http://localhost:3001/api/auth/me"
        );
    }
}
