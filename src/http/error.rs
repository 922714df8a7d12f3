//! Error taxonomy surfaced at the route boundary.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::scrape::ScrapeError;
use crate::security::Rejection;
use crate::tts::TtsError;

/// Every failure a route can produce, mapped onto an HTTP response.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Source address not admitted by the allowlist.
    #[error("{}", admission_detail(.0))]
    AdmissionDenied(Rejection),

    /// Missing, malformed, or wrong bearer token.
    #[error("Unauthorized")]
    Unauthorized,

    /// Caller input that cannot be forwarded.
    #[error("{0}")]
    BadRequest(String),

    /// The request body is not the JSON the route expects.
    #[error("{detail}")]
    InvalidBody { status: StatusCode, detail: String },

    /// The upstream could not be reached at all.
    #[error("Error connecting to upstream: {0}")]
    UpstreamUnreachable(String),

    /// The upstream answered with a failing status.
    #[error("Error fetching URL: {detail}")]
    UpstreamStatus { status: StatusCode, detail: String },

    /// No route matches the request path.
    #[error("Not Found")]
    NotFound,

    /// A required collaborator is not configured.
    #[error("{0}")]
    ServiceUnavailable(String),

    /// Anything else. The cause is returned to the caller unredacted.
    #[error("An unexpected error occurred: {0}")]
    Internal(String),
}

fn admission_detail(reason: &Rejection) -> &'static str {
    match reason {
        Rejection::MalformedAddress => "Invalid IP address",
        Rejection::OutsideRanges => "Forbidden",
    }
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::AdmissionDenied(_) => StatusCode::FORBIDDEN,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::InvalidBody { status, .. } => *status,
            Self::UpstreamUnreachable(_) => StatusCode::BAD_GATEWAY,
            Self::UpstreamStatus { status, .. } => *status,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON error body: `{"detail": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for GatewayError {
    fn from(rejection: JsonRejection) -> Self {
        GatewayError::InvalidBody {
            status: rejection.status(),
            detail: rejection.body_text(),
        }
    }
}

impl From<ScrapeError> for GatewayError {
    fn from(e: ScrapeError) -> Self {
        match e {
            ScrapeError::Status { status, url } => GatewayError::UpstreamStatus {
                status: StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                detail: format!("{} returned {}", url, status),
            },
            other => GatewayError::Internal(other.to_string()),
        }
    }
}

impl From<TtsError> for GatewayError {
    fn from(e: TtsError) -> Self {
        GatewayError::Internal(e.to_string())
    }
}
