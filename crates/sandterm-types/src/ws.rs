//! WebSocket message protocol between the browser console and the server.

use serde::{Deserialize, Serialize};

use crate::{ConnectionState, ViewMode};

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsClientMessage {
    /// Replace the command input (the input field changed).
    Input { text: String },
    /// A key press in the console.
    Key {
        /// DOM key name, e.g. "Enter", "ArrowUp" or a single character.
        key: String,
        #[serde(default)]
        ctrl: bool,
    },
    /// Submit the current input as a command.
    Submit,
    /// Interrupt the running streaming command.
    Interrupt,
    /// Load the previous history entry.
    HistoryPrevious,
    /// Load the next history entry.
    HistoryNext,
    /// Ping for keepalive.
    Ping { timestamp: u64 },
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsServerMessage {
    /// Full render state of the console.
    Frame {
        mode: ViewMode,
        /// Whether the command prompt should be rendered.
        show_prompt: bool,
        /// Lines of the active buffer, control sequences stripped except colors.
        lines: Vec<String>,
        /// Current command input.
        input: String,
        state: ConnectionState,
    },
    /// Error occurred.
    Error { code: String, message: String },
    /// Pong response.
    Pong { timestamp: u64 },
}
