//! Source-address admission middleware.
//!
//! Runs on every request, before routing. Exempt paths skip the range check.

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::http::error::GatewayError;
use crate::http::request::request_id;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::security::Admission;

/// Source address as presented to the allowlist.
///
/// With a configured peer header the first comma-separated entry of that
/// header is used; otherwise the socket peer. Empty when neither is present.
fn source_address(state: &AppState, request: &Request<Body>) -> String {
    if let Some(header) = &state.peer_address_header {
        return request
            .headers()
            .get(header)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .unwrap_or_default()
            .trim()
            .to_string();
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_default()
}

pub async fn admission_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, GatewayError> {
    let source = source_address(&state, &request);
    let path = request.uri().path();

    match state.allowlist.check(&source, path) {
        Admission::Admit => Ok(next.run(request).await),
        Admission::Reject(reason) => {
            tracing::warn!(
                request_id = %request_id(&request),
                source = %source,
                path = %path,
                reason = reason.as_str(),
                "Request rejected by allowlist"
            );
            metrics::record_admission_rejected(reason.as_str());
            Err(GatewayError::AdmissionDenied(reason))
        }
    }
}
