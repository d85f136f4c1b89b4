// Shared infrastructure
pub mod config;
pub mod error;
pub mod metrics;
pub mod telemetry;

// Signaling domain
pub mod registry;
pub mod signaling;

// Application layer
pub mod api;
pub mod server;
pub mod websocket;
