use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;

use crate::capture::NotificationEvent;

use super::state::AppState;

#[derive(Debug, Deserialize)]
struct WsIncoming {
    #[serde(rename = "type")]
    msg_type: String,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(client_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    tracing::info!("WebSocket connection request from client: {}", client_id);
    ws.on_upgrade(move |socket| handle_socket(socket, client_id, state))
}

async fn handle_socket(socket: WebSocket, client_id: String, state: Arc<AppState>) {
    tracing::info!("WebSocket connected: {}", client_id);
    state.client_connected(&client_id);

    let (mut sender, mut receiver) = socket.split();

    // Subscribe to notification events
    let mut rx = state.subscribe();

    // Task to forward notification events to this client
    let send_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let json = match serde_json::to_string(&event) {
                        Ok(j) => j,
                        Err(_) => continue,
                    };
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                // Slow client missed events; keep the connection alive.
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("Notification client lagged, skipped {} events", n);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    // Task to handle incoming messages (ping/pong)
    let state_clone = state.clone();
    let recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Text(text) = msg {
                if let Ok(incoming) = serde_json::from_str::<WsIncoming>(&text) {
                    if incoming.msg_type == "ping" {
                        state_clone.broadcast(NotificationEvent::Pong);
                    }
                }
            }
        }
    });

    // Wait for either task to complete
    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    state.client_disconnected(&client_id);
    tracing::info!("WebSocket disconnected: {}", client_id);
}
