//! API layer - HTTP endpoint handlers.

mod health;
mod index;
mod metrics;
mod routes;

pub use health::{health, stats, HealthResponse, StatsResponse};
pub use index::index;
pub use metrics::prometheus_metrics;
pub use routes::api_routes;
