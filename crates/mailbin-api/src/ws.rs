//! WebSocket handoff to the change notifier.

use axum::extract::State;
use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use mailbin_core::Event;
use tokio::sync::broadcast;

use crate::AppState;

/// `GET /api/v1/events`: upgrade the connection and stream change events.
///
/// The handler's only responsibility is handing the connection to the
/// broker; it forwards serialized events until the client disconnects.
pub(crate) async fn websocket_handler(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> Response {
    let events = state.broker.subscribe();
    ws.on_upgrade(move |socket| handle_socket(socket, events))
}

async fn handle_socket(mut socket: WebSocket, mut events: broadcast::Receiver<Event>) {
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    let Ok(payload) = serde_json::to_string(&event) else {
                        continue;
                    };
                    if socket.send(WsMessage::Text(payload)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "event subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                // Client frames are ignored; the feed is one-way.
                Some(Ok(_)) => {}
                _ => break,
            },
        }
    }

    tracing::debug!("event subscriber disconnected");
}
