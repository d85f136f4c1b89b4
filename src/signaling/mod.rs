//! Signaling core: message routing, departure handling and the
//! per-connection session state machine.

mod lifecycle;
mod router;
mod session;

pub use lifecycle::LifecycleManager;
pub use router::SignalRouter;
pub use session::Session;

use crate::metrics::RelayMetrics;
use crate::registry::{ConnectionHandle, SendError};
use crate::websocket::ServerMessage;

/// Reply sent to a viewer that registers while no broadcaster is online
pub const BROADCASTER_OFFLINE: &str = "Broadcaster is not online";

/// Best-effort delivery: a failed send is logged and counted, never propagated.
///
/// Never waits on the recipient, so a stalled peer cannot hold up the caller.
pub(crate) fn deliver(recipient: &ConnectionHandle, message: ServerMessage) -> bool {
    let message_type = message.message_type();
    record_outcome(recipient, message_type, recipient.send(message))
}

/// Send to the connection whose handler is calling; may wait on its own queue.
pub(crate) async fn reply(conn: &ConnectionHandle, message: ServerMessage) -> bool {
    let message_type = message.message_type();
    record_outcome(conn, message_type, conn.send_wait(message).await)
}

fn record_outcome(
    recipient: &ConnectionHandle,
    message_type: &'static str,
    result: Result<(), SendError>,
) -> bool {
    match result {
        Ok(()) => {
            RelayMetrics::record_relayed(message_type);
            true
        }
        Err(e) => {
            RelayMetrics::record_send_failure();
            tracing::warn!(
                recipient = %recipient.id,
                message_type,
                error = %e,
                "Failed to deliver message"
            );
            false
        }
    }
}
