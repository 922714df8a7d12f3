//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, route, status
//! - `gateway_request_duration_seconds` (histogram): latency per route
//! - `gateway_admission_rejected_total` (counter): filter rejections by reason
//! - `gateway_auth_rejected_total` (counter): bearer failures
//! - `gateway_active_relays` (gauge): open upstream relay streams
//! - `gateway_scrape_pages_total` / `gateway_scrape_comments_total` (counters)
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with an HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("gateway_request_duration_seconds", "route" => route.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_admission_rejected(reason: &'static str) {
    counter!("gateway_admission_rejected_total", "reason" => reason).increment(1);
}

pub fn record_auth_rejected() {
    counter!("gateway_auth_rejected_total").increment(1);
}

pub fn relay_opened() {
    gauge!("gateway_active_relays").increment(1.0);
}

pub fn relay_closed() {
    gauge!("gateway_active_relays").decrement(1.0);
}

pub fn record_scrape_page(comments: usize) {
    counter!("gateway_scrape_pages_total").increment(1);
    counter!("gateway_scrape_comments_total").increment(comments as u64);
}
