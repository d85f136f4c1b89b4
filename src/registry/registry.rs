use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::metrics::{BROADCASTER_ONLINE, VIEWERS_REGISTERED};

use super::{ConnectionHandle, ConnectionId, RegistryStats};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("connection {0} is registered as the broadcaster")]
    AlreadyBroadcaster(ConnectionId),
}

/// Outcome of `Registry::set_broadcaster`
#[derive(Debug)]
pub struct BroadcasterRegistration {
    /// Previous broadcaster, if a different connection held the slot
    pub superseded: Option<ConnectionId>,
    /// Viewers registered at the moment the slot was taken
    pub viewers: Vec<ConnectionId>,
}

/// Outcome of `Registry::add_viewer`
#[derive(Debug)]
pub struct ViewerRegistration {
    /// False when the viewer was already registered
    pub newly_added: bool,
    /// Broadcaster registered at the moment the viewer was added
    pub broadcaster: Option<Arc<ConnectionHandle>>,
}

#[derive(Default)]
struct RegistryInner {
    broadcaster: Option<Arc<ConnectionHandle>>,
    viewers: HashMap<ConnectionId, Arc<ConnectionHandle>>,
}

impl RegistryInner {
    fn update_gauges(&self) {
        BROADCASTER_ONLINE.set(self.broadcaster.is_some() as i64);
        VIEWERS_REGISTERED.set(self.viewers.len() as i64);
    }
}

/// Shared routing state for all connections.
///
/// Both fields sit behind one lock so that a registration and the fan-out that
/// follows it observe the same view. Handles are only used to address
/// messages; the owning connection task decides when a connection ends.
#[derive(Default)]
pub struct Registry {
    inner: Mutex<RegistryInner>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the broadcaster slot, silently superseding any previous holder
    pub async fn set_broadcaster(&self, conn: Arc<ConnectionHandle>) -> BroadcasterRegistration {
        let mut inner = self.inner.lock().await;

        let superseded = inner
            .broadcaster
            .as_ref()
            .map(|b| b.id)
            .filter(|id| *id != conn.id);

        // A connection is never both broadcaster and viewer
        inner.viewers.remove(&conn.id);
        inner.broadcaster = Some(conn);

        let viewers = inner.viewers.keys().copied().collect();
        inner.update_gauges();

        BroadcasterRegistration {
            superseded,
            viewers,
        }
    }

    /// Empty the broadcaster slot only if `id` still holds it.
    ///
    /// Returns the viewers registered at that moment, or `None` when the slot
    /// belonged to another connection (or was already empty).
    pub async fn clear_broadcaster_if(&self, id: ConnectionId) -> Option<Vec<Arc<ConnectionHandle>>> {
        let mut inner = self.inner.lock().await;

        if !inner.broadcaster.as_ref().is_some_and(|b| b.id == id) {
            return None;
        }

        inner.broadcaster = None;
        inner.update_gauges();
        Some(inner.viewers.values().cloned().collect())
    }

    /// Add a viewer; adding an already present viewer is a no-op
    pub async fn add_viewer(
        &self,
        conn: Arc<ConnectionHandle>,
    ) -> Result<ViewerRegistration, RegistryError> {
        let mut inner = self.inner.lock().await;

        if inner.broadcaster.as_ref().is_some_and(|b| b.id == conn.id) {
            return Err(RegistryError::AlreadyBroadcaster(conn.id));
        }

        let newly_added = !inner.viewers.contains_key(&conn.id);
        if newly_added {
            inner.viewers.insert(conn.id, conn);
            inner.update_gauges();
        }

        Ok(ViewerRegistration {
            newly_added,
            broadcaster: inner.broadcaster.clone(),
        })
    }

    /// Remove a viewer. Returns false if it was not registered.
    pub async fn remove_viewer(&self, id: ConnectionId) -> bool {
        let mut inner = self.inner.lock().await;
        let removed = inner.viewers.remove(&id).is_some();
        if removed {
            inner.update_gauges();
        }
        removed
    }

    pub async fn find_viewer_by_id(&self, id: ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.inner.lock().await.viewers.get(&id).cloned()
    }

    pub async fn broadcaster(&self) -> Option<Arc<ConnectionHandle>> {
        self.inner.lock().await.broadcaster.clone()
    }

    pub async fn viewers(&self) -> Vec<Arc<ConnectionHandle>> {
        self.inner.lock().await.viewers.values().cloned().collect()
    }

    pub async fn contains_viewer(&self, id: ConnectionId) -> bool {
        self.inner.lock().await.viewers.contains_key(&id)
    }

    pub async fn stats(&self) -> RegistryStats {
        let inner = self.inner.lock().await;
        let broadcaster_id = inner.broadcaster.as_ref().map(|b| b.id);

        RegistryStats {
            broadcaster_online: broadcaster_id.is_some(),
            broadcaster_id,
            viewer_count: inner.viewers.len(),
            viewer_ids: inner.viewers.keys().copied().collect(),
        }
    }
}
