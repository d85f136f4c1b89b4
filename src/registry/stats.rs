//! Registry statistics

use serde::Serialize;

use super::ConnectionId;

/// Point-in-time snapshot of the registry
#[derive(Debug, Clone, Serialize)]
pub struct RegistryStats {
    pub broadcaster_online: bool,
    pub broadcaster_id: Option<ConnectionId>,
    pub viewer_count: usize,
    pub viewer_ids: Vec<ConnectionId>,
}
