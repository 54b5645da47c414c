// src/core/metrics.rs

//! Defines and registers Prometheus metrics for gateway monitoring.
//!
//! This module uses `lazy_static` to ensure that metrics are registered only once
//! globally for the entire application lifecycle.

use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Gauge, Histogram, TextEncoder, register_counter, register_counter_vec,
    register_gauge, register_histogram,
};
use tracing::warn;

lazy_static! {
    // --- Gauges ---
    /// The number of clients currently connected to the gateway.
    pub static ref CONNECTED_CLIENTS: Gauge =
        register_gauge!("docgate_connected_clients", "Number of currently connected clients.").unwrap();
    /// The number of logical sessions held by the registry.
    pub static ref ACTIVE_SESSIONS: Gauge =
        register_gauge!("docgate_active_sessions", "Number of live logical sessions.").unwrap();
    /// Backend connections that currently exist, idle or checked out.
    pub static ref POOL_CONNECTIONS_OPEN: Gauge =
        register_gauge!("docgate_pool_connections_open", "Number of open backend connections.").unwrap();
    /// Pool slots currently held by requests.
    pub static ref POOL_CONNECTIONS_IN_USE: Gauge =
        register_gauge!("docgate_pool_connections_in_use", "Number of backend connections checked out.").unwrap();

    // --- Counters ---
    /// The total number of commands processed since startup.
    pub static ref COMMANDS_PROCESSED_TOTAL: Counter =
        register_counter!("docgate_commands_processed_total", "Total number of commands processed.").unwrap();
    /// The total number of connections accepted since startup.
    pub static ref CONNECTIONS_RECEIVED_TOTAL: Counter =
        register_counter!("docgate_connections_received_total", "Total number of connections received.").unwrap();
    /// Failed commands, labeled by the protocol error name returned to the client.
    pub static ref COMMAND_ERRORS_TOTAL: CounterVec =
        register_counter_vec!("docgate_command_errors_total", "Total number of failed commands, labeled by codeName.", &["code_name"]).unwrap();
    /// Acquisitions that gave up waiting for a pooled connection.
    pub static ref POOL_ACQUIRE_TIMEOUTS_TOTAL: Counter =
        register_counter!("docgate_pool_acquire_timeouts_total", "Total number of pool acquisitions that timed out.").unwrap();
    /// Sessions removed by the idle session reaper.
    pub static ref EXPIRED_SESSIONS_TOTAL: Counter =
        register_counter!("docgate_expired_sessions_total", "Total number of sessions expired for inactivity.").unwrap();

    // --- Histograms ---
    /// A histogram of command execution latencies.
    pub static ref COMMAND_LATENCY_SECONDS: Histogram =
        register_histogram!("docgate_command_latency_seconds", "Latency of command processing in seconds.").unwrap();
}

/// Gathers all registered metrics and encodes them in the Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder.encode_to_string(&metric_families).unwrap_or_else(|e| {
        warn!("Failed to encode metrics: {}", e);
        String::new()
    })
}
