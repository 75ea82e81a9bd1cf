//! Error types for sandterm consoles.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("Malformed output chunk: {0}")]
    MalformedChunk(String),

    #[error("Transport closed")]
    TransportClosed,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Session unavailable: {0}")]
    SessionUnavailable(String),

    #[error("Session limit exceeded: max {0} concurrent consoles")]
    SessionLimitExceeded(usize),

    #[error("Process spawn failed: {0}")]
    SpawnFailed(String),

    #[error("PTY error: {0}")]
    PtyError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
