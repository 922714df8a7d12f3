//! Streaming relay to a generative-content upstream.
//!
//! # Data Flow
//! ```text
//! POST /gemini-proxy {upstream_api_key, model, body}
//!     → validate model id, build upstream URL from template
//!     → acquire RelayGuard
//!     → single upstream POST (caller key in header, fixed timeout)
//!     → status + filtered headers + RelayBody(byte stream, guard)
//!     → client
//! ```
//!
//! # Design Decisions
//! - No retries; a transport failure is reported as 502
//! - Timeouts bound connecting and each read, never the whole relay
//! - The body is never buffered; chunks are forwarded as they arrive
//! - One shared client; per-request resources are owned by the body

pub mod relay;

use std::time::Duration;

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue},
    response::Response,
};
use serde::Deserialize;

use crate::config::UpstreamProxyConfig;
use crate::http::error::GatewayError;
use crate::http::response::relay_headers;
use crate::lifecycle::startup::StartupError;

pub use relay::{RelayBody, RelayGuard, RelayTracker};

/// Inbound relay request.
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyRequest {
    /// Key for the upstream API, supplied by the caller.
    #[serde(alias = "gemini_api_key")]
    pub upstream_api_key: String,

    /// Model identifier substituted into the upstream URL.
    pub model: String,

    /// Forwarded verbatim as the upstream JSON body.
    pub body: serde_json::Value,
}

/// Forwards requests to the configured upstream and relays the reply.
#[derive(Debug)]
pub struct UpstreamProxy {
    client: reqwest::Client,
    url_template: String,
    api_key_header: HeaderName,
    relays: RelayTracker,
}

impl UpstreamProxy {
    pub fn new(config: &UpstreamProxyConfig) -> Result<Self, StartupError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()
            .map_err(|e| StartupError::HttpClient(e.to_string()))?;

        let api_key_header = HeaderName::from_bytes(config.api_key_header.as_bytes())
            .map_err(|e| StartupError::Config(format!("proxy.api_key_header: {}", e)))?;

        Ok(Self {
            client,
            url_template: config.upstream_url.clone(),
            api_key_header,
            relays: RelayTracker::new(),
        })
    }

    /// Number of relays still holding an upstream stream.
    pub fn active_relays(&self) -> u64 {
        self.relays.active_count()
    }

    /// Upstream URL for `model`.
    pub fn upstream_url(&self, model: &str) -> Result<String, GatewayError> {
        let valid = !model.is_empty()
            && !model
                .chars()
                .any(|c| matches!(c, '/' | '?' | '#' | '%') || c.is_whitespace() || c.is_control());
        if !valid {
            return Err(GatewayError::BadRequest(format!("Invalid model identifier: {:?}", model)));
        }
        Ok(self.url_template.replace("{model}", model))
    }

    /// Issue the upstream call and build a streaming response from it.
    pub async fn forward(&self, request: ProxyRequest) -> Result<Response, GatewayError> {
        let url = self.upstream_url(&request.model)?;
        let api_key = HeaderValue::from_str(&request.upstream_api_key).map_err(|_| {
            GatewayError::BadRequest("upstream_api_key is not a valid header value".to_string())
        })?;

        // Held from here on; released when the body (or this future) is dropped.
        let guard = self.relays.track();

        tracing::debug!(relay_id = %guard.id(), model = %request.model, "Forwarding to upstream");

        let upstream = self
            .client
            .post(&url)
            .header(self.api_key_header.clone(), api_key)
            .json(&request.body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(relay_id = %guard.id(), model = %request.model, error = %e, "Error connecting to upstream");
                GatewayError::UpstreamUnreachable(e.to_string())
            })?;

        let status = upstream.status();
        let headers = relay_headers(upstream.headers());

        tracing::info!(relay_id = %guard.id(), status = %status, "Upstream responded, relaying");

        let body = RelayBody::new(Box::pin(upstream.bytes_stream()), guard);
        let mut response = Response::new(Body::from_stream(body));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }
}
