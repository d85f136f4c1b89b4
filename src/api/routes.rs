use axum::{routing::get, Router};

use crate::server::AppState;

use super::health::{health, stats};
use super::index::index;
use super::metrics::prometheus_metrics;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Client page
        .route("/", get(index))
        // Health & Stats
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/metrics", get(prometheus_metrics))
}
