//! Bearer token middleware for protected routes.

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::Response,
};

use crate::http::error::GatewayError;
use crate::http::request::request_id;
use crate::http::server::AppState;
use crate::observability::metrics;

pub async fn bearer_auth_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, GatewayError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    match state.auth.verify(header) {
        Ok(()) => Ok(next.run(request).await),
        Err(failure) => {
            tracing::debug!(
                request_id = %request_id(&request),
                path = %request.uri().path(),
                failure = ?failure,
                "Bearer authentication failed"
            );
            metrics::record_auth_rejected();
            Err(GatewayError::Unauthorized)
        }
    }
}
