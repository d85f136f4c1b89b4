//! Connection handle and related types

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

use crate::websocket::ServerMessage;

/// Process-local address of one connection, exchanged with clients as
/// `viewer_id` / `broadcaster_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Uuid> for ConnectionId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

/// Participant role, fixed by the first successful registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    #[default]
    Unset,
    Broadcaster,
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Unset => "unset",
            Role::Broadcaster => "broadcaster",
            Role::Viewer => "viewer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a message cannot be queued for a connection
#[derive(Debug, Clone, thiserror::Error)]
pub enum SendError {
    #[error("connection {0} is closed")]
    Closed(ConnectionId),
    #[error("outbound queue of connection {0} is full")]
    Full(ConnectionId),
}

/// Sending half of one WebSocket connection.
///
/// All outbound traffic for a connection goes through its bounded queue and is
/// written by a single writer task, so concurrent senders never interleave.
pub struct ConnectionHandle {
    pub id: ConnectionId,
    sender: mpsc::Sender<ServerMessage>,
}

impl ConnectionHandle {
    pub fn new(sender: mpsc::Sender<ServerMessage>) -> Self {
        Self::with_id(ConnectionId::new(), sender)
    }

    pub fn with_id(id: ConnectionId, sender: mpsc::Sender<ServerMessage>) -> Self {
        Self { id, sender }
    }

    /// Queue a message for this connection's writer task without waiting.
    ///
    /// Used for traffic addressed to another peer: a recipient whose queue is
    /// full is reported as `SendError::Full` instead of stalling the caller.
    pub fn send(&self, message: ServerMessage) -> Result<(), SendError> {
        self.sender.try_send(message).map_err(|e| match e {
            TrySendError::Full(_) => SendError::Full(self.id),
            TrySendError::Closed(_) => SendError::Closed(self.id),
        })
    }

    /// Queue a message, waiting for space. Only for a connection's own
    /// replies, where the caller is that connection's handler.
    pub async fn send_wait(&self, message: ServerMessage) -> Result<(), SendError> {
        self.sender
            .send(message)
            .await
            .map_err(|_| SendError::Closed(self.id))
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_ids_are_unique() {
        assert_ne!(ConnectionId::new(), ConnectionId::new());
    }

    #[test]
    fn test_connection_id_serializes_as_plain_string() {
        let id = ConnectionId::from(Uuid::nil());
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"00000000-0000-0000-0000-000000000000\"");
    }

    #[tokio::test]
    async fn test_send_queues_message() {
        let (tx, mut rx) = mpsc::channel(1);
        let handle = ConnectionHandle::new(tx);

        tokio_test::assert_ok!(handle.send(ServerMessage::BroadcasterDisconnected));
        assert_eq!(rx.recv().await, Some(ServerMessage::BroadcasterDisconnected));
    }

    #[tokio::test]
    async fn test_send_to_full_queue_fails_without_waiting() {
        let (tx, _rx) = mpsc::channel(1);
        let handle = ConnectionHandle::new(tx);

        tokio_test::assert_ok!(handle.send(ServerMessage::BroadcasterDisconnected));
        let result = handle.send(ServerMessage::BroadcasterDisconnected);
        assert!(matches!(result, Err(SendError::Full(id)) if id == handle.id));
    }

    #[tokio::test]
    async fn test_send_wait_after_receiver_dropped_fails() {
        let (tx, rx) = mpsc::channel(1);
        let handle = ConnectionHandle::new(tx);
        drop(rx);

        let result = handle.send_wait(ServerMessage::BroadcasterDisconnected).await;
        assert!(matches!(result, Err(SendError::Closed(_))));
    }

    #[test]
    fn test_debug_reports_id_and_liveness() {
        let (tx, rx) = mpsc::channel(1);
        let handle = ConnectionHandle::new(tx);
        let open = format!("{:?}", handle);
        assert!(open.contains(&handle.id.to_string()));
        assert!(open.contains("closed: false"));

        drop(rx);
        assert!(format!("{:?}", handle).contains("closed: true"));
    }

    #[tokio::test]
    async fn test_send_after_receiver_dropped_fails() {
        let (tx, rx) = mpsc::channel(1);
        let handle = ConnectionHandle::new(tx);
        drop(rx);

        assert!(handle.is_closed());
        let result = handle.send(ServerMessage::BroadcasterDisconnected);
        assert!(matches!(result, Err(SendError::Closed(id)) if id == handle.id));
    }
}
