//! WebSocket connection lifecycle management.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::http::routes::AppState;
use crate::protocol::ServerMessage;
use crate::ws::dispatch::Inbound;

pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: AppState, socket: WebSocket) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    // per-connection outbound queue; the registry and broadcaster push here
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    let conn = state.registry.register(tx.clone());
    info!(conn, "client connected");

    // forward queued server messages to the websocket
    let writer = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let text = serde_json::to_string(&msg).unwrap();
            if ws_tx.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let _ = tx.send(ServerMessage::Connected {
        content: "Successfully connected".to_owned(),
    });

    while let Some(Ok(msg)) = ws_rx.next().await {
        match msg {
            Message::Text(text) => {
                let _ = state.inbound.send(Inbound::Frame { conn, text });
            }
            Message::Close(_) => break,
            Message::Binary(_) | Message::Ping(_) | Message::Pong(_) => {}
        }
    }

    let _ = state.inbound.send(Inbound::Closed { conn });
    writer.abort();
    debug!(conn, "client disconnected");
}
