//! Metrics collection and exposition.
//!
//! # Metrics
//! - `idle_monitor_server_up` (gauge): 1=up, 0=down, -1=unknown, per server
//! - `idle_monitor_connections_established_total` (counter): per server
//! - `idle_monitor_connect_failures_total` (counter): per server
//! - `idle_monitor_connections_lost_total` (counter): per server, `clean` label
//!
//! # Design Decisions
//! - Without an installed recorder every call is a no-op
//! - Labels carry the endpoint as `host:port`

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::health::Verdict;
use crate::monitor::ServerEndpoint;

/// Install the Prometheus recorder and its HTTP scrape listener.
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_server_health(server: &ServerEndpoint, verdict: Verdict) {
    let value = match verdict {
        Verdict::Up => 1.0,
        Verdict::Down => 0.0,
        Verdict::Unknown => -1.0,
    };
    metrics::gauge!("idle_monitor_server_up", "server" => server.to_string()).set(value);
}

pub fn record_established(server: &ServerEndpoint) {
    metrics::counter!("idle_monitor_connections_established_total", "server" => server.to_string())
        .increment(1);
}

pub fn record_connect_failure(server: &ServerEndpoint) {
    metrics::counter!("idle_monitor_connect_failures_total", "server" => server.to_string())
        .increment(1);
}

pub fn record_connection_lost(server: &ServerEndpoint, clean: bool) {
    metrics::counter!(
        "idle_monitor_connections_lost_total",
        "server" => server.to_string(),
        "clean" => if clean { "true" } else { "false" }
    )
    .increment(1);
}
