//! Prometheus metrics endpoint.

use axum::{extract::State, http::header, response::IntoResponse};

use crate::error::{AppError, Result};
use crate::metrics::{self, BROADCASTER_ONLINE, VIEWERS_REGISTERED};
use crate::server::AppState;

/// GET /metrics - Prometheus metrics endpoint
pub async fn prometheus_metrics(State(state): State<AppState>) -> Result<impl IntoResponse> {
    // Refresh registry gauges from the authoritative snapshot
    let stats = state.registry.stats().await;
    BROADCASTER_ONLINE.set(stats.broadcaster_online as i64);
    VIEWERS_REGISTERED.set(stats.viewer_count as i64);

    let output = metrics::encode_metrics()
        .map_err(|e| AppError::Internal(format!("Failed to encode metrics: {}", e)))?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        output,
    ))
}
