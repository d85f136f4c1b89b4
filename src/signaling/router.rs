use std::sync::Arc;

use serde_json::Value;

use crate::metrics::RelayMetrics;
use crate::registry::{ConnectionHandle, ConnectionId, Registry, Role};
use crate::websocket::{CandidateTarget, ClientMessage, ServerMessage};

use super::{deliver, reply, BROADCASTER_OFFLINE};

/// Decides where each inbound message goes and in which envelope.
///
/// Holds no state of its own; everything cross-connection lives in the
/// [`Registry`]. Roles are only checked for registration, so e.g. a viewer
/// sending `offer` is relayed like a broadcaster would be.
#[derive(Clone)]
pub struct SignalRouter {
    registry: Arc<Registry>,
}

impl SignalRouter {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Route one message from `conn`. `role` is updated on a successful
    /// registration.
    pub async fn route(&self, conn: &Arc<ConnectionHandle>, role: &mut Role, msg: ClientMessage) {
        match msg {
            ClientMessage::RegisterBroadcaster => self.register_broadcaster(conn, role).await,
            ClientMessage::RegisterViewer => self.register_viewer(conn, role).await,
            ClientMessage::Offer { target_id, sdp } => self.relay_offer(target_id, sdp).await,
            ClientMessage::Answer { sdp } => self.relay_answer(conn, sdp).await,
            ClientMessage::Candidate {
                target,
                target_id,
                candidate,
            } => self.relay_candidate(conn, target, target_id, candidate).await,
            ClientMessage::Unknown => {
                tracing::debug!(connection_id = %conn.id, "Ignoring unknown message type");
            }
        }
    }

    async fn register_broadcaster(&self, conn: &Arc<ConnectionHandle>, role: &mut Role) {
        if *role == Role::Viewer {
            RelayMetrics::record_dropped("role_conflict");
            tracing::warn!(
                connection_id = %conn.id,
                "Viewer attempted to register as broadcaster; ignoring"
            );
            return;
        }

        let registration = self.registry.set_broadcaster(conn.clone()).await;
        *role = Role::Broadcaster;

        if let Some(previous) = registration.superseded {
            tracing::warn!(
                connection_id = %conn.id,
                previous = %previous,
                "Replacing existing broadcaster"
            );
        }
        tracing::info!(
            connection_id = %conn.id,
            waiting_viewers = registration.viewers.len(),
            "Broadcaster registered"
        );

        // Tell the new broadcaster about everyone already waiting
        for viewer_id in registration.viewers {
            if !reply(conn, ServerMessage::NewViewer { viewer_id }).await {
                break;
            }
        }
    }

    async fn register_viewer(&self, conn: &Arc<ConnectionHandle>, role: &mut Role) {
        if *role == Role::Broadcaster {
            RelayMetrics::record_dropped("role_conflict");
            tracing::warn!(
                connection_id = %conn.id,
                "Broadcaster attempted to register as viewer; ignoring"
            );
            return;
        }

        let registration = match self.registry.add_viewer(conn.clone()).await {
            Ok(r) => r,
            Err(e) => {
                RelayMetrics::record_dropped("role_conflict");
                tracing::warn!(connection_id = %conn.id, error = %e, "Viewer registration refused");
                return;
            }
        };
        *role = Role::Viewer;

        if registration.newly_added {
            tracing::info!(connection_id = %conn.id, "Viewer registered");
        }

        match registration.broadcaster {
            Some(broadcaster) => {
                deliver(&broadcaster, ServerMessage::NewViewer { viewer_id: conn.id });
            }
            None => {
                reply(conn, ServerMessage::error(BROADCASTER_OFFLINE)).await;
            }
        }
    }

    async fn relay_offer(&self, target_id: Option<ConnectionId>, sdp: Value) {
        let Some(viewer) = self.lookup_viewer(target_id).await else {
            return;
        };

        let broadcaster_id = self.registry.broadcaster().await.map(|b| b.id);
        deliver(&viewer, ServerMessage::Offer { sdp, broadcaster_id });
    }

    async fn relay_answer(&self, conn: &ConnectionHandle, sdp: Value) {
        let Some(broadcaster) = self.registry.broadcaster().await else {
            RelayMetrics::record_dropped("no_broadcaster");
            tracing::debug!(connection_id = %conn.id, "Dropping answer: no broadcaster");
            return;
        };

        deliver(
            &broadcaster,
            ServerMessage::Answer {
                sdp,
                viewer_id: conn.id,
            },
        );
    }

    async fn relay_candidate(
        &self,
        conn: &ConnectionHandle,
        target: Option<CandidateTarget>,
        target_id: Option<ConnectionId>,
        candidate: Value,
    ) {
        match target {
            Some(CandidateTarget::Broadcaster) => {
                let Some(broadcaster) = self.registry.broadcaster().await else {
                    RelayMetrics::record_dropped("no_broadcaster");
                    tracing::debug!(connection_id = %conn.id, "Dropping candidate: no broadcaster");
                    return;
                };

                deliver(
                    &broadcaster,
                    ServerMessage::Candidate {
                        candidate,
                        viewer_id: Some(conn.id),
                    },
                );
            }
            Some(CandidateTarget::Viewer) => {
                let Some(viewer) = self.lookup_viewer(target_id).await else {
                    return;
                };

                deliver(
                    &viewer,
                    ServerMessage::Candidate {
                        candidate,
                        viewer_id: None,
                    },
                );
            }
            None => {
                RelayMetrics::record_dropped("missing_target");
                tracing::debug!(connection_id = %conn.id, "Dropping candidate without target");
            }
        }
    }

    /// Resolve a viewer address; misses are dropped silently
    async fn lookup_viewer(&self, target_id: Option<ConnectionId>) -> Option<Arc<ConnectionHandle>> {
        let Some(target_id) = target_id else {
            RelayMetrics::record_dropped("missing_target");
            return None;
        };

        let viewer = self.registry.find_viewer_by_id(target_id).await;
        if viewer.is_none() {
            RelayMetrics::record_dropped("unknown_target");
            tracing::debug!(target_id = %target_id, "No viewer with that id");
        }
        viewer
    }
}
