//! services/sensei/src/web/ws_handler.rs
//!
//! Entry points and control loops for the two WebSocket connections: the
//! editor host channel and the mentor panel channel.

use crate::web::{
    panel::{handle_host_event, handle_panel_request},
    protocol::{HostEvent, PanelRequest},
    state::{AppState, PanelAttach},
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{
    stream::{SplitSink, StreamExt},
    SinkExt,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tracing::{error, info, warn};

/// Upgrades the editor host's connection.
pub async fn host_ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_host_socket(socket, app_state))
}

/// Upgrades the mentor panel's connection.
pub async fn panel_ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_panel_socket(socket, app_state))
}

async fn handle_host_socket(socket: WebSocket, app_state: Arc<AppState>) {
    info!("Editor host connected.");
    let (sender, mut receiver) = socket.split();
    let (tx, rx) = unbounded_channel();
    app_state.session.lock().await.attach_host(tx.clone());
    let forwarder = tokio::spawn(forward_outbound(rx, sender));

    while let Some(frame) = receiver.next().await {
        match frame {
            Ok(Message::Text(text)) => match serde_json::from_str::<HostEvent>(&text) {
                Ok(event) => handle_host_event(&app_state, &app_state.session, event).await,
                Err(e) => warn!("Failed to deserialize host event: {}", e),
            },
            Ok(Message::Close(_)) => {
                info!("Editor host sent close message.");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Editor host connection error: {}", e);
                break;
            }
        }
    }

    // --- Cleanup ---
    app_state.session.lock().await.detach_host(&tx);
    forwarder.abort();
    info!("Editor host disconnected.");
}

async fn handle_panel_socket(socket: WebSocket, app_state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, rx) = unbounded_channel();

    let attach = app_state.session.lock().await.attach_panel(tx.clone());
    if attach == PanelAttach::Focused {
        info!("A panel is already open; focused it and closing the duplicate.");
        let _ = sender.send(Message::Close(None)).await;
        return;
    }
    info!("Mentor panel connected.");
    let forwarder = tokio::spawn(forward_outbound(rx, sender));

    // Requests are handled in order, so a quiz is always generated before a
    // submission that follows it on this connection is graded.
    while let Some(frame) = receiver.next().await {
        match frame {
            Ok(Message::Text(text)) => match serde_json::from_str::<PanelRequest>(&text) {
                Ok(request) => {
                    handle_panel_request(&app_state, &app_state.session, request).await
                }
                Err(e) => warn!("Failed to deserialize panel request: {}", e),
            },
            Ok(Message::Close(_)) => {
                info!("Panel sent close message.");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Panel connection error: {}", e);
                break;
            }
        }
    }

    // --- Cleanup ---
    app_state.session.lock().await.detach_panel(&tx);
    forwarder.abort();
    info!("Mentor panel closed.");
}

/// Drains an outbound channel into a WebSocket sink as JSON text frames.
async fn forward_outbound<T: Serialize + Send + 'static>(
    mut rx: UnboundedReceiver<T>,
    mut sink: SplitSink<WebSocket, Message>,
) {
    while let Some(msg) = rx.recv().await {
        let json = match serde_json::to_string(&msg) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize outbound message: {}", e);
                continue;
            }
        };
        if sink.send(Message::Text(json.into())).await.is_err() {
            warn!("Failed to send message; the client may have disconnected.");
            break;
        }
    }
}
