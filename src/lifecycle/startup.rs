//! Startup orchestration.
//!
//! # Responsibilities
//! - Turn a validated config into runtime components
//! - Report what the gateway is about to serve
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners start last (traffic only when ready)

use thiserror::Error;

use crate::config::schema::{GatewayConfig, PLACEHOLDER_AUTH_TOKEN};
use crate::security::allowlist::AllowlistError;

/// Errors that prevent the gateway from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    /// A config value was accepted by validation but is unusable at runtime.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The allowlist could not be built.
    #[error("allowlist: {0}")]
    Allowlist(#[from] AllowlistError),

    /// An outbound HTTP client could not be constructed.
    #[error("http client: {0}")]
    HttpClient(String),

    /// Binding, TLS material, or serving failed.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Log the effective configuration before listeners start.
pub fn announce(config: &GatewayConfig) {
    tracing::info!(
        bind_address = %config.listener.bind_address,
        tls = config.listener.tls.is_some(),
        allowed_ranges = config.security.allowed_ranges.len(),
        allow_loopback = config.security.allow_loopback,
        exempt_paths = ?config.security.exempt_paths,
        request_timeout_secs = config.timeouts.request_secs,
        upstream_timeout_secs = config.proxy.timeout_secs,
        scrape_pace_ms = config.scraper.pace_ms,
        "Configuration loaded"
    );

    if config.security.auth_token == PLACEHOLDER_AUTH_TOKEN {
        tracing::warn!("security.auth_token is the built-in placeholder; set it or GATEWAY_AUTH_TOKEN");
    }
}
