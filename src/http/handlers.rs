//! Route handlers.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
    Json,
};

use crate::http::error::GatewayError;
use crate::http::server::AppState;
use crate::proxy::ProxyRequest;
use crate::scrape::{ScrapeRequest, ScrapeResult};
use crate::tts::SynthesisRequest;

pub const ROBOTS_TXT: &str = "User-agent: *\nDisallow: /";

pub async fn robots_txt() -> impl IntoResponse {
    ([(CONTENT_TYPE, "text/plain; charset=utf-8")], ROBOTS_TXT)
}

pub async fn gemini_proxy(
    State(state): State<AppState>,
    payload: Result<Json<ProxyRequest>, JsonRejection>,
) -> Result<Response, GatewayError> {
    let Json(request) = payload?;
    state.proxy.forward(request).await
}

pub async fn scrape(
    State(state): State<AppState>,
    payload: Result<Json<ScrapeRequest>, JsonRejection>,
) -> Result<Json<ScrapeResult>, GatewayError> {
    let Json(request) = payload?;
    match state.scraper.scrape(&request.url).await {
        Ok(result) => Ok(Json(result)),
        Err(e) => {
            tracing::error!(url = %request.url, error = %e, "Scrape failed");
            Err(e.into())
        }
    }
}

pub async fn tts(
    State(state): State<AppState>,
    payload: Result<Json<SynthesisRequest>, JsonRejection>,
) -> Result<Response, GatewayError> {
    let Json(request) = payload?;
    let service = state.tts.as_ref().ok_or_else(|| {
        GatewayError::ServiceUnavailable("No speech synthesizer configured".to_string())
    })?;

    let audio = service.render(request).await.map_err(|e| {
        tracing::error!(error = %e, "Speech synthesis failed");
        GatewayError::from(e)
    })?;

    Ok(([(CONTENT_TYPE, state.tts_content_type.clone())], audio).into_response())
}

pub async fn not_found() -> GatewayError {
    GatewayError::NotFound
}
