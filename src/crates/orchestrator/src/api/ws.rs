//! WebSocket push channel for task observers
//!
//! GET /ws/tasks/:id upgrades the connection, subscribes it to the event
//! bus, and forwards every broadcast event as a JSON text frame. The first
//! frame is the subscription confirmation. A disconnecting observer is
//! unsubscribed; an observer disconnecting mid-broadcast is tolerated by the
//! bus's best-effort delivery.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tracing::debug;

use crate::api::routes::AppState;

/// Handler for GET /ws/tasks/:id
pub async fn ws_tasks_handler(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, task_id))
}

async fn handle_socket(socket: WebSocket, state: AppState, task_id: String) {
    let mut subscription = state.events.subscribe(&task_id);
    debug!(%task_id, "Observer connected");

    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            event = subscription.rx.recv() => {
                let Some(event) = event else { break };
                let Ok(text) = serde_json::to_string(&event) else { break };
                if sink.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    // Inbound frames are ignored; the channel is push-only
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    state.events.unsubscribe(&task_id, subscription.id);
    debug!(%task_id, "Observer disconnected");
}
