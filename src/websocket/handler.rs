use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::metrics::{RelayMetrics, WS_CONNECTIONS_CLOSED, WS_CONNECTIONS_OPENED, WS_CONNECTION_DURATION};
use crate::registry::ConnectionHandle;
use crate::server::AppState;
use crate::signaling::Session;

use super::message::ServerMessage;

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an established WebSocket connection
#[tracing::instrument(
    name = "ws.connection",
    skip_all,
    fields(
        connection_id = tracing::field::Empty,
        otel.kind = "server"
    )
)]
async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection_start = std::time::Instant::now();

    // Create channel for sending messages to this connection
    let (tx, mut rx) =
        mpsc::channel::<ServerMessage>(state.settings.websocket.channel_buffer_size.max(1));
    let handle = Arc::new(ConnectionHandle::new(tx));
    let connection_id = handle.id;
    tracing::Span::current().record("connection_id", tracing::field::display(connection_id));

    WS_CONNECTIONS_OPENED.inc();
    tracing::info!(connection_id = %connection_id, "WebSocket connection established");

    let mut session = Session::new(handle, state.router.clone(), state.lifecycle.clone());

    // Split socket into sender and receiver
    let (mut ws_sender, mut ws_receiver) = socket.split();

    // Single writer per connection; forwarded messages and our own replies
    // are queued here and never interleave on the socket
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let text = match msg.to_json() {
                Ok(t) => t,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize message");
                    continue;
                }
            };

            if ws_sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    loop {
        tokio::select! {
            _ = &mut send_task => {
                tracing::debug!(connection_id = %connection_id, "Send task completed");
                break;
            }
            frame = ws_receiver.next() => match frame {
                Some(Ok(msg)) => {
                    if !process_message(msg, &mut session).await {
                        break;
                    }
                }
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "WebSocket receive error");
                    break;
                }
                None => break,
            }
        }
    }

    // Departure cleanup runs exactly once, whatever ended the loop
    session.close().await;
    send_task.abort();

    WS_CONNECTIONS_CLOSED.inc();
    let duration = connection_start.elapsed().as_secs_f64();
    WS_CONNECTION_DURATION.observe(duration);

    tracing::info!(
        connection_id = %connection_id,
        duration_secs = duration,
        "WebSocket connection closed"
    );
}

/// Process a received WebSocket frame.
/// Returns false if the connection should be closed
async fn process_message(msg: Message, session: &mut Session) -> bool {
    match msg {
        Message::Text(text) => {
            session.handle_text(text.as_str()).await;
            true
        }
        Message::Binary(_) => {
            RelayMetrics::record_parse_error();
            tracing::warn!(connection_id = %session.id(), "Binary messages are not supported");
            true
        }
        // Axum answers pings itself
        Message::Ping(_) | Message::Pong(_) => true,
        Message::Close(_) => {
            tracing::debug!(connection_id = %session.id(), "Received close frame");
            false
        }
    }
}
