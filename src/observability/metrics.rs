//! Metrics collection and exposition.
//!
//! # Metrics
//! - `contact_submissions_total` (counter): submissions by outcome
//! - `contact_rate_limited_total` (counter): submissions rejected by the limiter
//! - `contact_dispatch_duration_seconds` (histogram): verify + send latency by result
//! - `contact_rate_limit_identifiers` (gauge): identifiers tracked by the limiter
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_submission(outcome: &'static str) {
    metrics::counter!("contact_submissions_total", "outcome" => outcome).increment(1);
}

pub fn record_rate_limited() {
    metrics::counter!("contact_rate_limited_total").increment(1);
}

pub fn record_dispatch(result: &'static str, started: Instant) {
    metrics::histogram!("contact_dispatch_duration_seconds", "result" => result)
        .record(started.elapsed().as_secs_f64());
}

pub fn record_tracked_identifiers(count: usize) {
    metrics::gauge!("contact_rate_limit_identifiers").set(count as f64);
}
