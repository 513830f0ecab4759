//! Metrics collection and exposition.
//!
//! # Metrics
//! - `stub_requests_total` (counter): requests by method, status
//! - `stub_request_duration_seconds` (histogram): latency, delay included
//! - `stub_reloads_total` (counter): reloads by trigger, outcome
//! - `stub_routes` (gauge): declarations in the published table
//!
//! Recording is a no-op until a recorder is installed, so library users and
//! tests pay nothing for it.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and serve it on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
    ];
    metrics::counter!("stub_requests_total", &labels).increment(1);
    metrics::histogram!("stub_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_reload(trigger: &'static str, outcome: &'static str) {
    metrics::counter!("stub_reloads_total", "trigger" => trigger, "outcome" => outcome).increment(1);
}

pub fn set_route_count(routes: usize) {
    metrics::gauge!("stub_routes").set(routes as f64);
}
