//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check that URL templates and CIDR ranges are usable
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use url::Url;

use crate::config::schema::GatewayConfig;
use crate::security::cidr::IpRange;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("not a socket address: {}", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    let security = &config.security;
    if security.auth_token.trim().is_empty() {
        errors.push(ValidationError::new("security.auth_token", "must not be empty"));
    }
    if security.allowed_ranges.is_empty() && !security.allow_loopback {
        errors.push(ValidationError::new(
            "security.allowed_ranges",
            "at least one range is required",
        ));
    }
    for range in &security.allowed_ranges {
        if let Err(e) = range.parse::<IpRange>() {
            errors.push(ValidationError::new("security.allowed_ranges", e.to_string()));
        }
    }
    for path in &security.exempt_paths {
        if !path.starts_with('/') {
            errors.push(ValidationError::new(
                "security.exempt_paths",
                format!("path must start with '/': {}", path),
            ));
        }
    }
    if security.max_body_size == 0 {
        errors.push(ValidationError::new("security.max_body_size", "must be greater than 0"));
    }

    let proxy = &config.proxy;
    if !proxy.upstream_url.contains("{model}") {
        errors.push(ValidationError::new(
            "proxy.upstream_url",
            "must contain a {model} placeholder",
        ));
    } else if Url::parse(&proxy.upstream_url.replace("{model}", "model")).is_err() {
        errors.push(ValidationError::new(
            "proxy.upstream_url",
            format!("not a valid URL: {}", proxy.upstream_url),
        ));
    }
    if axum::http::HeaderName::from_bytes(proxy.api_key_header.as_bytes()).is_err() {
        errors.push(ValidationError::new(
            "proxy.api_key_header",
            format!("not a valid header name: {}", proxy.api_key_header),
        ));
    }
    if proxy.timeout_secs == 0 {
        errors.push(ValidationError::new("proxy.timeout_secs", "must be greater than 0"));
    }

    let scraper = &config.scraper;
    match Url::parse(&scraper.origin) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        _ => errors.push(ValidationError::new(
            "scraper.origin",
            format!("not an absolute http(s) URL: {}", scraper.origin),
        )),
    }
    if scraper.page_param.is_empty() {
        errors.push(ValidationError::new("scraper.page_param", "must not be empty"));
    }
    if scraper.page_timeout_secs == 0 {
        errors.push(ValidationError::new("scraper.page_timeout_secs", "must be greater than 0"));
    }
    if scraper.max_pages == 0 {
        errors.push(ValidationError::new("scraper.max_pages", "must be greater than 0"));
    }

    if config.tts.transcoder_program.trim().is_empty() {
        errors.push(ValidationError::new("tts.transcoder_program", "must not be empty"));
    }

    let observability = &config.observability;
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("not a socket address: {}", observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(validate_config(&GatewayConfig::default()), Ok(()));
    }

    #[test]
    fn collects_every_error() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "nowhere".into();
        config.security.auth_token = " ".into();
        config.security.allowed_ranges = vec!["10.0.0.0/40".into()];
        config.proxy.upstream_url = "https://example.com/models".into();
        config.scraper.origin = "/relative".into();
        config.scraper.max_pages = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "listener.bind_address",
                "security.auth_token",
                "security.allowed_ranges",
                "proxy.upstream_url",
                "scraper.origin",
                "scraper.max_pages",
            ]
        );
    }

    #[test]
    fn empty_ranges_need_loopback() {
        let mut config = GatewayConfig::default();
        config.security.allowed_ranges.clear();
        assert!(validate_config(&config).is_ok());

        config.security.allow_loopback = false;
        assert!(validate_config(&config).is_err());
    }
}
