//! WebSocket streaming for real-time missile updates.
use crate::state::{AppState, StreamEvent};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

/// Handler for WebSocket connections.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> axum::response::Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
        .into_response()
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    // Subscribe before taking the snapshot so no tick falls between the two.
    let mut rx = state.subscribe();
    tracing::debug!("Subscriber connected ({} total)", state.subscriber_count());

    if let Some(payload) = StreamEvent::initial_data(state.snapshot()).to_payload() {
        if socket.send(Message::Text(payload.to_string())).await.is_err() {
            return;
        }
    }

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Ping(payload))) => {
                        if socket.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) | None => break,
                }
            }
            event = rx.recv() => {
                match event {
                    Ok(payload) => {
                        if socket.send(Message::Text(payload.to_string())).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!("Subscriber lagged, dropped {} message(s)", skipped);
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!("Subscriber disconnected");
}
