//! Connection registry: the single broadcaster slot and the viewer set.

mod registry;
mod stats;
mod types;

pub use registry::{BroadcasterRegistration, Registry, RegistryError, ViewerRegistration};
pub use stats::RegistryStats;
pub use types::{ConnectionHandle, ConnectionId, Role, SendError};
