//! WebSocket connection handling.
//!
//! Each connection owns one console. A single task reacts to browser messages and PTY
//! events in arrival order and answers every change with a fresh frame.

use crate::state::{AppState, ConsoleGuard};
use anyhow::Result;
use axum::extract::ws::{Message, WebSocket};
use futures::{stream::SplitSink, SinkExt, StreamExt};
use sandterm_core::{ChannelEvent, ConsoleError, ConsoleSession, PtyChannel, Transport};
use sandterm_types::{WsClientMessage, WsServerMessage};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

pub async fn handle_websocket(
    socket: WebSocket,
    state: Arc<AppState>,
    target: String,
    guard: ConsoleGuard,
) -> Result<()> {
    let console_id = guard.id();
    let (mut ws_tx, mut ws_rx) = socket.split();

    let (channel, mut events) = match PtyChannel::spawn(&state.pty_options(&target)) {
        Ok(spawned) => spawned,
        Err(e) => {
            warn!(target: "sandterm::ws", "Console {} could not start a shell: {}", console_id, e);
            send(&mut ws_tx, &error_message(&e)).await?;
            return Ok(());
        }
    };

    let mut console = ConsoleSession::new(channel, state.config.streaming.allow_list());
    if let Some(prompt) = &state.config.local_echo {
        console = console.with_local_echo(prompt.clone());
    }
    info!(target: "sandterm::ws", "Console {} connected to {}", console_id, target);

    send(&mut ws_tx, &console.view().to_frame()).await?;

    let max_input_size = state.config.max_input_size;
    let mut channel_open = true;

    loop {
        let replies = tokio::select! {
            msg = ws_rx.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    if text.as_str().len() > max_input_size {
                        warn!(
                            target: "sandterm::ws",
                            "Message too large ({} bytes) from console {}, max {} bytes",
                            text.as_str().len(),
                            console_id,
                            max_input_size
                        );
                        continue;
                    }
                    match serde_json::from_str::<WsClientMessage>(text.as_str()) {
                        Ok(client_msg) => handle_client_message(&mut console, client_msg),
                        Err(e) => {
                            debug!(target: "sandterm::ws", "Ignoring unparseable message from console {}: {}", console_id, e);
                            continue;
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    debug!(target: "sandterm::ws", "WebSocket receive failed for console {}: {}", console_id, e);
                    break;
                }
            },
            event = events.recv(), if channel_open => match event {
                Some(event) => {
                    if matches!(event, ChannelEvent::Closed | ChannelEvent::Failed(_)) {
                        channel_open = false;
                    }
                    handle_channel_event(&mut console, event)
                }
                None => {
                    channel_open = false;
                    handle_channel_event(&mut console, ChannelEvent::Closed)
                }
            },
        };

        let mut failed = false;
        for reply in &replies {
            if let Err(e) = send(&mut ws_tx, reply).await {
                debug!(target: "sandterm::ws", "WebSocket send failed for console {}: {}", console_id, e);
                failed = true;
                break;
            }
        }
        if failed {
            break;
        }
    }

    console.close();
    info!(target: "sandterm::ws", "Console {} disconnected", console_id);
    Ok(())
}

/// Apply one browser message; returns the messages to send back.
pub fn handle_client_message<T: Transport>(
    console: &mut ConsoleSession<T>,
    msg: WsClientMessage,
) -> Vec<WsServerMessage> {
    let result = match msg {
        WsClientMessage::Ping { timestamp } => {
            trace!(target: "sandterm::ws::ping", "Sent pong for timestamp: {}", timestamp);
            return vec![WsServerMessage::Pong { timestamp }];
        }
        WsClientMessage::Input { text } => {
            console.set_input(text);
            Ok(())
        }
        WsClientMessage::Key { key, ctrl } => console.handle_key(&key, ctrl),
        WsClientMessage::Submit => console.submit(),
        WsClientMessage::Interrupt => console.interrupt().map(|_| ()),
        WsClientMessage::HistoryPrevious => {
            console.history_previous();
            Ok(())
        }
        WsClientMessage::HistoryNext => {
            console.history_next();
            Ok(())
        }
    };
    with_frame(console, result)
}

/// Apply one channel event; returns the messages to send back.
pub fn handle_channel_event<T: Transport>(
    console: &mut ConsoleSession<T>,
    event: ChannelEvent,
) -> Vec<WsServerMessage> {
    let result = console.handle_event(event);
    with_frame(console, result)
}

fn with_frame<T: Transport>(
    console: &ConsoleSession<T>,
    result: sandterm_core::Result<()>,
) -> Vec<WsServerMessage> {
    let mut replies = Vec::with_capacity(2);
    if let Err(e) = result {
        replies.push(error_message(&e));
    }
    replies.push(console.view().to_frame());
    replies
}

fn error_message(e: &ConsoleError) -> WsServerMessage {
    WsServerMessage::Error {
        code: error_code(e).to_string(),
        message: e.to_string(),
    }
}

fn error_code(e: &ConsoleError) -> &'static str {
    match e {
        ConsoleError::MalformedChunk(_) => "malformed_chunk",
        ConsoleError::TransportClosed => "transport_closed",
        ConsoleError::Transport(_) | ConsoleError::IoError(_) => "transport_error",
        ConsoleError::SessionUnavailable(_) => "session_unavailable",
        ConsoleError::SessionLimitExceeded(_) => "session_limit",
        ConsoleError::SpawnFailed(_) | ConsoleError::PtyError(_) => "spawn_failed",
    }
}

async fn send(ws_tx: &mut SplitSink<WebSocket, Message>, msg: &WsServerMessage) -> Result<()> {
    let json = serde_json::to_string(msg)?;
    ws_tx.send(Message::Text(json.into())).await?;
    Ok(())
}
