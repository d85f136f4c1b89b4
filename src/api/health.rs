//! Health check and statistics endpoints.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::metrics::{
    MESSAGES_DROPPED_TOTAL, MESSAGES_RELAYED_TOTAL, PARSE_ERRORS_TOTAL, SEND_FAILURES_TOTAL,
    WS_CONNECTIONS_CLOSED, WS_CONNECTIONS_OPENED,
};
use crate::registry::RegistryStats;
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub broadcaster_online: bool,
    pub viewers: usize,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub registry: RegistryStats,
    pub relay: RelayStats,
}

#[derive(Debug, Serialize)]
pub struct RelayStats {
    pub connections_opened: u64,
    pub connections_closed: u64,
    pub messages_relayed: u64,
    pub messages_dropped: u64,
    pub send_failures: u64,
    pub parse_errors: u64,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let stats = state.registry.stats().await;

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        broadcaster_online: stats.broadcaster_online,
        viewers: stats.viewer_count,
    })
}

pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let registry = state.registry.stats().await;

    Json(StatsResponse {
        registry,
        relay: RelayStats {
            connections_opened: WS_CONNECTIONS_OPENED.get(),
            connections_closed: WS_CONNECTIONS_CLOSED.get(),
            messages_relayed: sum_counter_vec(&MESSAGES_RELAYED_TOTAL),
            messages_dropped: sum_counter_vec(&MESSAGES_DROPPED_TOTAL),
            send_failures: SEND_FAILURES_TOTAL.get(),
            parse_errors: PARSE_ERRORS_TOTAL.get(),
        },
    })
}

/// Sum a counter over all of its label values
fn sum_counter_vec(counter: &prometheus::IntCounterVec) -> u64 {
    use prometheus::core::Collector;

    counter
        .collect()
        .iter()
        .flat_map(|family| family.get_metric())
        .map(|m| m.get_counter().get_value() as u64)
        .sum()
}
