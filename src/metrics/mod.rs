//! Prometheus metrics for the signaling relay.
//!
//! - Connection metrics (opened, closed, duration)
//! - Registry gauges (broadcaster online, registered viewers)
//! - Relay metrics (forwarded by type, dropped by reason, send failures, parse errors)

mod helpers;

pub use helpers::{encode_metrics, RelayMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "signaling";

lazy_static! {
    // ============================================================================
    // Connection Metrics
    // ============================================================================

    /// Total WebSocket connections opened
    pub static ref WS_CONNECTIONS_OPENED: IntCounter = register_int_counter!(
        format!("{}_ws_connections_opened_total", METRIC_PREFIX),
        "Total WebSocket connections opened"
    ).unwrap();

    /// Total WebSocket connections closed
    pub static ref WS_CONNECTIONS_CLOSED: IntCounter = register_int_counter!(
        format!("{}_ws_connections_closed_total", METRIC_PREFIX),
        "Total WebSocket connections closed"
    ).unwrap();

    /// WebSocket connection lifetime in seconds
    pub static ref WS_CONNECTION_DURATION: Histogram = register_histogram!(
        format!("{}_ws_connection_duration_seconds", METRIC_PREFIX),
        "WebSocket connection duration in seconds",
        vec![1.0, 10.0, 60.0, 300.0, 900.0, 3600.0, 14400.0]
    ).unwrap();

    // ============================================================================
    // Registry Metrics
    // ============================================================================

    /// 1 while a broadcaster is registered
    pub static ref BROADCASTER_ONLINE: IntGauge = register_int_gauge!(
        format!("{}_broadcaster_online", METRIC_PREFIX),
        "Whether a broadcaster is currently registered"
    ).unwrap();

    /// Number of registered viewers
    pub static ref VIEWERS_REGISTERED: IntGauge = register_int_gauge!(
        format!("{}_viewers_registered", METRIC_PREFIX),
        "Number of currently registered viewers"
    ).unwrap();

    // ============================================================================
    // Relay Metrics
    // ============================================================================

    /// Messages delivered to a peer's outbound queue, by server message type
    pub static ref MESSAGES_RELAYED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_messages_relayed_total", METRIC_PREFIX),
        "Messages queued for delivery to a peer",
        &["type"]
    ).unwrap();

    /// Messages dropped before delivery, by reason
    pub static ref MESSAGES_DROPPED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_messages_dropped_total", METRIC_PREFIX),
        "Messages dropped without delivery",
        &["reason"]
    ).unwrap();

    /// Sends that failed because the recipient had gone away
    pub static ref SEND_FAILURES_TOTAL: IntCounter = register_int_counter!(
        format!("{}_send_failures_total", METRIC_PREFIX),
        "Failed sends to a recipient connection"
    ).unwrap();

    /// Inbound frames that could not be parsed
    pub static ref PARSE_ERRORS_TOTAL: IntCounter = register_int_counter!(
        format!("{}_parse_errors_total", METRIC_PREFIX),
        "Inbound WebSocket messages that failed to parse"
    ).unwrap();

    /// Inbound messages by client message type
    pub static ref WS_MESSAGES_RECEIVED: IntCounterVec = register_int_counter_vec!(
        format!("{}_ws_messages_received_total", METRIC_PREFIX),
        "WebSocket messages received from clients",
        &["type"]
    ).unwrap();
}
