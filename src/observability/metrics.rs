//! Metrics collection and exposition.
//!
//! # Metrics
//! - `janitor_pool_events_total` (counter): lifecycle events seen by a recording janitor, by pool, kind
//! - `janitor_tracked_handles` (gauge): handles currently held in a recording ledger
//! - `janitor_dropped_captures_total` (counter): captures discarded because the ledger was full
//! - `janitor_leaks_suspected_total` (counter): leak reports surfaced by a pool
//! - `janitor_probe_total` (counter): reachability probes by locality, outcome
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed, so library users pay nothing
//! - The minimal janitor never touches this module

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::janitor::EventKind;

/// Install the Prometheus recorder and its HTTP scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_pool_event(pool: &str, kind: EventKind) {
    metrics::counter!(
        "janitor_pool_events_total",
        "pool" => pool.to_string(),
        "kind" => kind.as_str()
    )
    .increment(1);
}

pub fn record_tracked_handles(pool: &str, count: usize) {
    metrics::gauge!("janitor_tracked_handles", "pool" => pool.to_string()).set(count as f64);
}

pub fn record_dropped_capture(pool: &str) {
    metrics::counter!("janitor_dropped_captures_total", "pool" => pool.to_string()).increment(1);
}

pub fn record_leak_suspected(pool: &str) {
    metrics::counter!("janitor_leaks_suspected_total", "pool" => pool.to_string()).increment(1);
}

pub fn record_probe(locality: &'static str, success: bool) {
    let outcome = if success { "ok" } else { "failed" };
    metrics::counter!("janitor_probe_total", "locality" => locality, "outcome" => outcome)
        .increment(1);
}
