use std::sync::Arc;

use crate::metrics::RelayMetrics;
use crate::registry::{ConnectionHandle, ConnectionId, Role};
use crate::websocket::ClientMessage;

use super::{LifecycleManager, SignalRouter};

/// Signaling state of one open connection.
///
/// Starts with no role, takes one on the first successful registration and
/// ends in [`Session::close`], which consumes the session so departure
/// cleanup runs exactly once.
pub struct Session {
    handle: Arc<ConnectionHandle>,
    role: Role,
    router: SignalRouter,
    lifecycle: LifecycleManager,
}

impl Session {
    pub fn new(
        handle: Arc<ConnectionHandle>,
        router: SignalRouter,
        lifecycle: LifecycleManager,
    ) -> Self {
        Self {
            handle,
            role: Role::Unset,
            router,
            lifecycle,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.handle.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn handle(&self) -> &Arc<ConnectionHandle> {
        &self.handle
    }

    /// Parse and route one text frame. Malformed input is logged and dropped.
    #[tracing::instrument(
        name = "ws.message",
        skip_all,
        fields(connection_id = %self.handle.id, role = %self.role)
    )]
    pub async fn handle_text(&mut self, text: &str) {
        let msg: ClientMessage = match serde_json::from_str(text) {
            Ok(m) => m,
            Err(e) => {
                RelayMetrics::record_parse_error();
                tracing::warn!(error = %e, "Failed to parse client message");
                return;
            }
        };

        RelayMetrics::record_received(msg.message_type());
        tracing::debug!(message_type = msg.message_type(), "Received message");

        self.router.route(&self.handle, &mut self.role, msg).await;
    }

    /// Terminal step of the connection: unregister and notify peers
    pub async fn close(self) {
        self.lifecycle.on_disconnect(&self.handle, self.role).await;
    }
}
