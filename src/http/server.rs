//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build runtime components (allowlist, authenticator, proxy, scraper, speech) from config
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, body limit, admission, auth)
//! - Serve over plain TCP or TLS with graceful shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::{HeaderName, HeaderValue, Request},
    middleware,
    routing::{get, post},
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::GatewayConfig;
use crate::http::handlers;
use crate::http::middleware::{admission_middleware, bearer_auth_middleware, track_metrics};
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::lifecycle::shutdown;
use crate::lifecycle::StartupError;
use crate::proxy::UpstreamProxy;
use crate::scrape::{HttpPageSource, Scraper};
use crate::security::{Allowlist, BearerAuth};
use crate::tts::{SpeechSynthesizer, Transcoder, TtsService};

/// Grace period for in-flight TLS connections after shutdown is triggered.
const TLS_DRAIN_SECS: u64 = 30;

/// Application state injected into handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub allowlist: Arc<Allowlist>,
    pub auth: Arc<BearerAuth>,
    pub peer_address_header: Option<HeaderName>,
    pub proxy: Arc<UpstreamProxy>,
    pub scraper: Arc<Scraper<HttpPageSource>>,
    pub tts: Option<Arc<TtsService>>,
    pub tts_content_type: HeaderValue,
}

fn request_span(request: &Request<Body>) -> tracing::Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id(request),
    )
}

/// The request gateway.
pub struct GatewayServer {
    config: GatewayConfig,
    state: AppState,
}

impl GatewayServer {
    /// Build every runtime component from `config`.
    ///
    /// No synthesizer is attached; `/tts` answers 503 until
    /// [`with_synthesizer`](Self::with_synthesizer) is called.
    pub fn new(config: GatewayConfig) -> Result<Self, StartupError> {
        let allowlist = Allowlist::from_config(&config.security)?;

        let peer_address_header = config
            .security
            .peer_address_header
            .as_deref()
            .map(|h| {
                HeaderName::from_bytes(h.as_bytes()).map_err(|e| {
                    StartupError::Config(format!("security.peer_address_header: {}", e))
                })
            })
            .transpose()?;

        let tts_content_type = HeaderValue::from_str(&config.tts.content_type)
            .map_err(|e| StartupError::Config(format!("tts.content_type: {}", e)))?;

        let proxy = UpstreamProxy::new(&config.proxy)?;
        let scraper = Scraper::new(HttpPageSource::new(&config.scraper)?, &config.scraper)?;

        let state = AppState {
            allowlist: Arc::new(allowlist),
            auth: Arc::new(BearerAuth::new(config.security.auth_token.clone())),
            peer_address_header,
            proxy: Arc::new(proxy),
            scraper: Arc::new(scraper),
            tts: None,
            tts_content_type,
        };

        Ok(Self { config, state })
    }

    /// Attach the speech synthesizer behind `/tts`.
    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        let transcoder = Transcoder::from_config(&self.config.tts);
        self.state.tts = Some(Arc::new(TtsService::new(synthesizer, transcoder)));
        self
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// The full application router with all layers applied.
    pub fn router(&self) -> Router {
        Self::build_router(&self.config, self.state.clone())
    }

    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let protected = Router::new()
            .route("/tts", post(handlers::tts))
            .route("/gemini-proxy", post(handlers::gemini_proxy))
            .route("/api/scrape", post(handlers::scrape))
            .route_layer(middleware::from_fn_with_state(
                state.clone(),
                bearer_auth_middleware,
            ));

        // Router layers wrap outward: admission sees every request before the
        // body limit or timeout can answer for it.
        Router::new()
            .route("/robots.txt", get(handlers::robots_txt))
            .merge(protected)
            .route_layer(middleware::from_fn(track_metrics))
            .fallback(handlers::not_found)
            .layer(DefaultBodyLimit::max(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                admission_middleware,
            ))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(propagate_request_id_layer())
                    .layer(TraceLayer::new_for_http().make_span_with(request_span)),
            )
    }

    /// Serve plain HTTP on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self
            .router()
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Serve HTTPS on `addr` until `shutdown` fires.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        tracing::info!(address = %addr, "HTTPS server starting");

        let handle = axum_server::Handle::new();
        let drain = handle.clone();
        tokio::spawn(async move {
            shutdown::wait(shutdown).await;
            drain.graceful_shutdown(Some(Duration::from_secs(TLS_DRAIN_SECS)));
        });

        let app = self
            .router()
            .into_make_service_with_connect_info::<SocketAddr>();

        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(app)
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }
}
