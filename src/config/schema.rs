//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the site.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Default plain-HTTP bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Bind address used when TLS is configured and no address was given.
pub const DEFAULT_TLS_BIND_ADDRESS: &str = "0.0.0.0:443";

/// Root configuration for the site server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SiteConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Content locations and the public virtual host.
    pub site: ContentConfig,

    /// Metrics endpoint settings.
    pub metrics: MetricsConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Log output settings.
    pub logging: LoggingConfig,
}

impl SiteConfig {
    /// Scheme the site is reachable under, derived from the TLS setting.
    pub fn scheme(&self) -> &'static str {
        if self.listener.tls.is_some() {
            "https"
        } else {
            "http"
        }
    }

    /// Absolute base URL used for feed links.
    pub fn base_url(&self) -> String {
        match &self.site.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("{}://{}", self.scheme(), self.site.host),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,

    /// Plain-HTTP address that redirects to HTTPS. Only used with TLS.
    pub redirect_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            tls: None,
            redirect_address: "0.0.0.0:80".to_string(),
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// How article files map to public URLs and dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PathConvention {
    /// Line two holds a `DD/MM/YYYY` date; the URL is `/b/<file stem>`.
    #[default]
    Metadata,
    /// The file name starts with `YYYY-MM-DD-`; the URL is `/YYYY/MM/DD/<rest>`.
    DatedFilename,
}

/// Content locations and site identity.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Virtual host every content request must carry (e.g., "example.com").
    pub host: String,

    /// Title used for the home page and the feed channel.
    pub title: String,

    /// Public base URL; derived from scheme and host when unset.
    pub base_url: Option<String>,

    /// Directory holding one file per article.
    pub pages_dir: String,

    /// Directory holding static assets.
    pub static_dir: String,

    /// JSON file mapping old paths to redirect targets.
    pub alias_file: String,

    /// URL prefix static assets are served under.
    pub static_prefix: String,

    /// Convention used to derive article dates and paths.
    pub path_convention: PathConvention,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            host: "localhost:8080".to_string(),
            title: "Blog".to_string(),
            base_url: None,
            pages_dir: "blog".to_string(),
            static_dir: "static".to_string(),
            alias_file: "alias.json".to_string(),
            static_prefix: "/s/".to_string(),
            path_convention: PathConvention::Metadata,
        }
    }
}

/// Metrics endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Path the Prometheus exposition is served on.
    pub path: String,

    /// Bearer token required to read metrics. Must be set.
    pub token: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            path: "/metrics".to_string(),
            token: String::new(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Deadline for a connection to deliver its request head, in seconds.
    pub header_read_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { header_read_secs: 1 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence.
    pub filter: String,

    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "memsite=info,tower_http=info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: SiteConfig = toml::from_str(
            r#"
            [site]
            host = "example.com"
            path_convention = "dated-filename"

            [metrics]
            token = "secret"
            "#,
        )
        .unwrap();

        assert_eq!(config.site.host, "example.com");
        assert_eq!(config.site.path_convention, PathConvention::DatedFilename);
        assert_eq!(config.site.static_prefix, "/s/");
        assert_eq!(config.metrics.path, "/metrics");
        assert_eq!(config.listener.bind_address, DEFAULT_BIND_ADDRESS);
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn base_url_follows_scheme() {
        let mut config = SiteConfig::default();
        config.site.host = "example.com".into();
        assert_eq!(config.base_url(), "http://example.com");

        config.listener.tls = Some(TlsConfig::default());
        assert_eq!(config.base_url(), "https://example.com");

        config.site.base_url = Some("https://blog.example.com/".into());
        assert_eq!(config.base_url(), "https://blog.example.com");
    }
}
