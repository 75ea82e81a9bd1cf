//! WebSocket route handler.

use crate::state::{AppState, ConsoleGuard};
use crate::websocket::handle_websocket;
use axum::{
    extract::{
        ws::{WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{error, warn};

pub async fn upgrade(
    State(state): State<Arc<AppState>>,
    Path(target): Path<String>,
    ws: WebSocketUpgrade,
) -> Response {
    let guard = match state.attach(&target) {
        Ok(guard) => guard,
        Err(e) => {
            warn!(target: "sandterm::ws", "Refusing console for {}: {}", target, e);
            return (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response();
        }
    };
    ws.on_upgrade(move |socket| handle_connection(socket, state, target, guard))
}

async fn handle_connection(
    socket: WebSocket,
    state: Arc<AppState>,
    target: String,
    guard: ConsoleGuard,
) {
    let console_id = guard.id();
    if let Err(e) = handle_websocket(socket, state, target, guard).await {
        error!(target: "sandterm::ws", "WebSocket error for console {}: {}", console_id, e);
    }
}
