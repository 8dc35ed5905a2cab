//! Metrics collection and exposition.
//!
//! # Metrics
//! - `router_lookups_total` (counter): lookups by outcome
//! - `router_hot_cache_total` (counter): hot-path cache lookups by result
//! - `router_routes` (gauge): registered (method, pattern) pairs
//! - `router_snapshot_swaps_total` (counter): published route snapshots
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - The Prometheus exporter is opt-in via `init_metrics`

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::routing::MatchOutcome;

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

#[inline]
pub fn record_lookup(outcome: MatchOutcome) {
    metrics::counter!("router_lookups_total", "outcome" => outcome.as_str()).increment(1);
}

#[inline]
pub fn record_hot_cache(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    metrics::counter!("router_hot_cache_total", "result" => result).increment(1);
}

pub fn record_route_count(routes: usize) {
    metrics::gauge!("router_routes").set(routes as f64);
}

pub fn record_snapshot_swap() {
    metrics::counter!("router_snapshot_swaps_total").increment(1);
}
