//! Requests sent to the remote execution channel.

use serde::{Deserialize, Serialize};

/// Control actions understood by the remote side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelAction {
    /// Stop the foreground command (Ctrl-C).
    Terminate,
}

/// A message for the remote channel.
///
/// Serializes to the channel's JSON framing: `{"command": "ls"}` for commands and
/// `{"action": "terminate"}` for control actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChannelRequest {
    Command { command: String },
    Action { action: ChannelAction },
}

impl ChannelRequest {
    pub fn command(command: impl Into<String>) -> Self {
        ChannelRequest::Command { command: command.into() }
    }

    pub fn terminate() -> Self {
        ChannelRequest::Action { action: ChannelAction::Terminate }
    }
}
