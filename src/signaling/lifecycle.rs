use std::sync::Arc;

use crate::registry::{ConnectionHandle, Registry, Role};
use crate::websocket::ServerMessage;

use super::deliver;

/// Removes a departed connection from the registry and tells the remaining
/// peers about it.
#[derive(Clone)]
pub struct LifecycleManager {
    registry: Arc<Registry>,
}

impl LifecycleManager {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Clean up after `conn`, whose last assigned role was `role`.
    ///
    /// Never fails: delivery problems are logged by [`deliver`].
    #[tracing::instrument(
        name = "signaling.disconnect",
        skip_all,
        fields(connection_id = %conn.id, role = %role)
    )]
    pub async fn on_disconnect(&self, conn: &ConnectionHandle, role: Role) {
        match role {
            Role::Broadcaster => {
                // A superseded broadcaster must not clear its replacement
                let Some(viewers) = self.registry.clear_broadcaster_if(conn.id).await else {
                    tracing::info!("Superseded broadcaster disconnected");
                    return;
                };

                tracing::info!(viewers = viewers.len(), "Broadcaster disconnected");
                for viewer in viewers {
                    deliver(&viewer, ServerMessage::BroadcasterDisconnected);
                }
            }
            Role::Viewer => {
                if !self.registry.remove_viewer(conn.id).await {
                    return;
                }

                tracing::info!("Viewer disconnected");
                if let Some(broadcaster) = self.registry.broadcaster().await {
                    deliver(
                        &broadcaster,
                        ServerMessage::ViewerDisconnected { viewer_id: conn.id },
                    );
                }
            }
            Role::Unset => {
                tracing::debug!("Unregistered connection closed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    fn handle() -> (Arc<ConnectionHandle>, mpsc::Receiver<ServerMessage>) {
        let (tx, rx) = mpsc::channel(8);
        (Arc::new(ConnectionHandle::new(tx)), rx)
    }

    #[tokio::test]
    async fn test_broadcaster_departure_notifies_viewers() {
        let registry = Arc::new(Registry::new());
        let lifecycle = LifecycleManager::new(registry.clone());
        let (broadcaster, _b_rx) = handle();
        let (viewer, mut v_rx) = handle();

        registry.add_viewer(viewer.clone()).await.unwrap();
        registry.set_broadcaster(broadcaster.clone()).await;

        lifecycle.on_disconnect(&broadcaster, Role::Broadcaster).await;

        assert_eq!(v_rx.try_recv().unwrap(), ServerMessage::BroadcasterDisconnected);
        assert!(v_rx.try_recv().is_err());
        assert!(registry.broadcaster().await.is_none());
    }

    #[tokio::test]
    async fn test_superseded_broadcaster_departure_is_silent() {
        let registry = Arc::new(Registry::new());
        let lifecycle = LifecycleManager::new(registry.clone());
        let (old, _old_rx) = handle();
        let (new, _new_rx) = handle();
        let (viewer, mut v_rx) = handle();

        registry.add_viewer(viewer.clone()).await.unwrap();
        registry.set_broadcaster(old.clone()).await;
        registry.set_broadcaster(new.clone()).await;

        lifecycle.on_disconnect(&old, Role::Broadcaster).await;

        assert!(v_rx.try_recv().is_err());
        assert_eq!(registry.broadcaster().await.map(|b| b.id), Some(new.id));
    }

    #[tokio::test]
    async fn test_viewer_departure_notifies_broadcaster_once() {
        let registry = Arc::new(Registry::new());
        let lifecycle = LifecycleManager::new(registry.clone());
        let (broadcaster, mut b_rx) = handle();
        let (viewer, _v_rx) = handle();

        registry.set_broadcaster(broadcaster.clone()).await;
        registry.add_viewer(viewer.clone()).await.unwrap();

        lifecycle.on_disconnect(&viewer, Role::Viewer).await;
        lifecycle.on_disconnect(&viewer, Role::Viewer).await;

        assert_eq!(
            b_rx.try_recv().unwrap(),
            ServerMessage::ViewerDisconnected {
                viewer_id: viewer.id
            }
        );
        assert!(b_rx.try_recv().is_err());
        assert!(!registry.contains_viewer(viewer.id).await);
    }

    #[tokio::test]
    async fn test_unregistered_departure_touches_nothing() {
        let registry = Arc::new(Registry::new());
        let lifecycle = LifecycleManager::new(registry.clone());
        let (broadcaster, mut b_rx) = handle();
        let (stranger, _rx) = handle();

        registry.set_broadcaster(broadcaster.clone()).await;
        lifecycle.on_disconnect(&stranger, Role::Unset).await;

        assert!(b_rx.try_recv().is_err());
        assert!(registry.broadcaster().await.is_some());
    }

    #[tokio::test]
    async fn test_dead_viewer_does_not_block_others() {
        let registry = Arc::new(Registry::new());
        let lifecycle = LifecycleManager::new(registry.clone());
        let (broadcaster, _b_rx) = handle();
        let (dead, dead_rx) = handle();
        let (alive, mut alive_rx) = handle();

        registry.add_viewer(dead.clone()).await.unwrap();
        registry.add_viewer(alive.clone()).await.unwrap();
        registry.set_broadcaster(broadcaster.clone()).await;
        drop(dead_rx);

        lifecycle.on_disconnect(&broadcaster, Role::Broadcaster).await;

        assert_eq!(alive_rx.try_recv().unwrap(), ServerMessage::BroadcasterDisconnected);
    }

    #[tokio::test]
    async fn test_stalled_viewer_does_not_block_departure() {
        let registry = Arc::new(Registry::new());
        let lifecycle = LifecycleManager::new(registry.clone());
        let (broadcaster, _b_rx) = handle();

        // Queue already full and never drained
        let (stalled_tx, _stalled_rx) = mpsc::channel(1);
        let stalled = Arc::new(ConnectionHandle::new(stalled_tx));
        stalled.send(ServerMessage::BroadcasterDisconnected).unwrap();
        registry.add_viewer(stalled.clone()).await.unwrap();

        let mut healthy = Vec::new();
        for _ in 0..3 {
            let (viewer, rx) = handle();
            registry.add_viewer(viewer).await.unwrap();
            healthy.push(rx);
        }
        registry.set_broadcaster(broadcaster.clone()).await;

        timeout(
            Duration::from_secs(2),
            lifecycle.on_disconnect(&broadcaster, Role::Broadcaster),
        )
        .await
        .expect("departure cleanup must not wait on a stalled viewer");

        for rx in healthy.iter_mut() {
            assert_eq!(rx.try_recv().unwrap(), ServerMessage::BroadcasterDisconnected);
        }
        assert!(registry.broadcaster().await.is_none());
    }
}
