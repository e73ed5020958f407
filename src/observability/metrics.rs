//! Metrics collection and exposition.
//!
//! # Metrics
//! - `ledger_endpoint_health` (gauge): 1=healthy, 0=unhealthy, per endpoint
//! - `ledger_failovers_total` (counter): active endpoint switches
//! - `ledger_rpc_calls_total` (counter): RPC calls by endpoint, method, outcome
//! - `ledger_rpc_latency_seconds` (histogram): RPC latency by method
//! - `ledger_confirmations_total` (counter): tracker outcomes
//! - `ledger_cache_lookups_total` (counter): cache hits and misses
//! - `ledger_throttle_wait_seconds` (histogram): time spent waiting for a slot
//!
//! # Design Decisions
//! - Without an installed recorder every call is a no-op
//! - Label values are owned strings; endpoints are low-cardinality

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter with an HTTP listener on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_endpoint_health(endpoint: &str, healthy: bool) {
    gauge!("ledger_endpoint_health", "endpoint" => endpoint.to_string())
        .set(if healthy { 1.0 } else { 0.0 });
}

pub fn record_failover(from: &str, to: &str) {
    counter!(
        "ledger_failovers_total",
        "from" => from.to_string(),
        "to" => to.to_string()
    )
    .increment(1);
}

pub fn record_rpc_call(endpoint: &str, method: &'static str, success: bool, latency: Duration) {
    let outcome = if success { "ok" } else { "error" };
    counter!(
        "ledger_rpc_calls_total",
        "endpoint" => endpoint.to_string(),
        "method" => method,
        "outcome" => outcome
    )
    .increment(1);
    histogram!("ledger_rpc_latency_seconds", "method" => method).record(latency.as_secs_f64());
}

pub fn record_confirmation(outcome: &'static str, polls: u32) {
    counter!("ledger_confirmations_total", "outcome" => outcome).increment(1);
    histogram!("ledger_confirmation_polls").record(f64::from(polls));
}

pub fn record_cache_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    counter!("ledger_cache_lookups_total", "result" => result).increment(1);
}

pub fn record_throttle_wait(waited: Duration) {
    histogram!("ledger_throttle_wait_seconds").record(waited.as_secs_f64());
}
