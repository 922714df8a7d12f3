//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Placeholder bearer secret shipped in the defaults.
pub const PLACEHOLDER_AUTH_TOKEN: &str = "CHANGE_ME_IN_PRODUCTION";

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Admission and authentication settings.
    pub security: SecurityConfig,

    /// Generative-API relay settings.
    pub proxy: UpstreamProxyConfig,

    /// Forum scraper settings.
    pub scraper: ScraperConfig,

    /// Speech route settings.
    pub tts: TtsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8443").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8443".to_string(),
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upper bound on producing a response, in seconds.
    ///
    /// Bounds a scrape job as a whole. Streamed relay bodies are not cut
    /// off by this once the response head has been sent.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 300 }
    }
}

/// Admission filter and authenticator configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Shared bearer secret for protected routes.
    pub auth_token: String,

    /// CIDR ranges admitted by the filter.
    pub allowed_ranges: Vec<String>,

    /// Admit 127.0.0.1 for local testing.
    pub allow_loopback: bool,

    /// Paths that bypass the address check entirely.
    pub exempt_paths: Vec<String>,

    /// Take the client address from this header instead of the TCP peer.
    pub peer_address_header: Option<String>,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            // WARNING: This is a placeholder! Change this in production.
            auth_token: PLACEHOLDER_AUTH_TOKEN.to_string(),
            allowed_ranges: cloudflare_ranges(),
            allow_loopback: true,
            exempt_paths: vec!["/robots.txt".to_string()],
            peer_address_header: None,
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Published Cloudflare edge ranges.
pub fn cloudflare_ranges() -> Vec<String> {
    [
        "173.245.48.0/20",
        "103.21.244.0/22",
        "103.22.200.0/22",
        "103.31.4.0/22",
        "141.101.64.0/18",
        "108.162.192.0/18",
        "190.93.240.0/20",
        "188.114.96.0/20",
        "197.234.240.0/22",
        "198.41.128.0/17",
        "162.158.0.0/15",
        "104.16.0.0/13",
        "104.24.0.0/14",
        "172.64.0.0/13",
        "131.0.72.0/22",
        "2400:cb00::/32",
        "2606:4700::/32",
        "2803:f800::/32",
        "2405:b500::/32",
        "2405:8100::/32",
        "2a06:98c0::/29",
        "2c0f:f248::/32",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Generative-API relay configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamProxyConfig {
    /// Upstream URL template; `{model}` is replaced by the caller's model id.
    pub upstream_url: String,

    /// Header carrying the caller-supplied upstream key.
    pub api_key_header: String,

    /// Upstream connect timeout, and the longest gap allowed between reads,
    /// in seconds. A relay that keeps producing chunks is never cut off.
    pub timeout_secs: u64,
}

impl Default for UpstreamProxyConfig {
    fn default() -> Self {
        Self {
            upstream_url:
                "https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent"
                    .to_string(),
            api_key_header: "x-goog-api-key".to_string(),
            timeout_secs: 120,
        }
    }
}

/// Forum scraper configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Origin used to resolve relative avatar URLs.
    pub origin: String,

    /// Query parameter selecting a comment page.
    pub page_param: String,

    /// Pause after each page fetch, in milliseconds.
    pub pace_ms: u64,

    /// Per-fetch timeout in seconds.
    pub page_timeout_secs: u64,

    /// Upper bound on comment pages fetched for one article.
    pub max_pages: u32,

    pub user_agent: String,
    pub accept: String,
    pub accept_language: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            origin: "https://www.0db.co.kr".to_string(),
            page_param: "cpage".to_string(),
            pace_ms: 200,
            page_timeout_secs: 30,
            max_pages: 500,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string(),
            accept: "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,image/apng,*/*;q=0.8".to_string(),
            accept_language: "en-US,en;q=0.9,ko;q=0.8".to_string(),
        }
    }
}

/// Speech route configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TtsConfig {
    /// Transcoder executable.
    pub transcoder_program: String,

    /// Arguments; the transcoder must read WAV on stdin and write to stdout.
    pub transcoder_args: Vec<String>,

    /// Content type of the transcoder output.
    pub content_type: String,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            transcoder_program: "ffmpeg".to_string(),
            transcoder_args: ["-i", "pipe:0", "-f", "mp3", "-b:a", "320k", "pipe:1"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            content_type: "audio/mpeg".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_toml_uses_defaults() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [security]
            auth_token = "s3cret"
            "#,
        )
        .unwrap();

        assert_eq!(config.security.auth_token, "s3cret");
        assert_eq!(config.security.allowed_ranges.len(), 22);
        assert_eq!(config.security.exempt_paths, vec!["/robots.txt"]);
        assert_eq!(config.proxy.timeout_secs, 120);
        assert_eq!(config.scraper.pace_ms, 200);
        assert_eq!(config.scraper.max_pages, 500);
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
    }

    #[test]
    fn log_format_parses_lowercase() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }
}
