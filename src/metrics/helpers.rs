//! Metrics helper for convenient metric recording

use prometheus::{Encoder, TextEncoder};

use super::{
    MESSAGES_DROPPED_TOTAL, MESSAGES_RELAYED_TOTAL, PARSE_ERRORS_TOTAL, SEND_FAILURES_TOTAL,
    WS_MESSAGES_RECEIVED,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording relay metrics
pub struct RelayMetrics;

impl RelayMetrics {
    pub fn record_received(message_type: &str) {
        WS_MESSAGES_RECEIVED.with_label_values(&[message_type]).inc();
    }

    pub fn record_relayed(message_type: &str) {
        MESSAGES_RELAYED_TOTAL.with_label_values(&[message_type]).inc();
    }

    /// `reason` is one of `no_broadcaster`, `unknown_target`, `missing_target`, `role_conflict`
    pub fn record_dropped(reason: &str) {
        MESSAGES_DROPPED_TOTAL.with_label_values(&[reason]).inc();
    }

    pub fn record_send_failure() {
        SEND_FAILURES_TOTAL.inc();
    }

    pub fn record_parse_error() {
        PARSE_ERRORS_TOTAL.inc();
    }
}
