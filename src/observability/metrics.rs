//! Metrics collection and exposition.
//!
//! # Metrics
//! - `requests_total` (counter): comparisons by `api` (route key) and
//!   `state` (outcome label)
//!
//! Without an installed recorder every update is a no-op.

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Counter of compared requests.
pub const REQUESTS_TOTAL: &str = "requests_total";

/// Install the Prometheus recorder and its scrape listener on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Count one comparison of `route` ending in `state`.
pub fn record_comparison(route: &str, state: &'static str) {
    metrics::counter!(REQUESTS_TOTAL, "api" => route.to_string(), "state" => state).increment(1);
}
