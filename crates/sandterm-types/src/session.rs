//! Console session types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which buffer a console is showing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    /// Prompt visible, output appends to the transcript.
    #[default]
    Main,
    /// Prompt hidden, output overwrites the live view.
    Stream,
}

/// State of the channel behind a console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConnectionState {
    /// Channel is open and accepting input.
    Connected,
    /// Remote side closed the channel normally.
    Disconnected,
    /// Channel failed; the session no longer accepts input.
    Failed { message: String },
}

impl ConnectionState {
    /// Whether the console may still send to its channel.
    pub fn accepts_input(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

/// A console currently attached to the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleSummary {
    pub id: Uuid,
    /// Name of the sandbox the console was opened for.
    pub target: String,
    /// Shell program running behind the console.
    pub shell: String,
    pub attached_at: DateTime<Utc>,
}
