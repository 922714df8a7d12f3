//! Response handling and transformation.
//!
//! # Responsibilities
//! - Copy upstream response headers for the client
//! - Drop transport-framing headers that would conflict with our own
//!
//! # Design Decisions
//! - Streaming responses avoid buffering entire body
//! - Only the framing headers are removed; everything else passes through

use axum::http::header::{CONNECTION, CONTENT_ENCODING, TRANSFER_ENCODING};
use axum::http::{HeaderMap, HeaderName};

/// Upstream headers never relayed to the client.
pub const EXCLUDED_RESPONSE_HEADERS: [HeaderName; 3] =
    [CONTENT_ENCODING, TRANSFER_ENCODING, CONNECTION];

/// Copy `upstream` minus the excluded framing headers.
pub fn relay_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(upstream.len());
    for (name, value) in upstream.iter() {
        if !EXCLUDED_RESPONSE_HEADERS.contains(name) {
            headers.append(name.clone(), value.clone());
        }
    }
    headers
}
