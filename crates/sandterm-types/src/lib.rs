//! Shared types for the sandterm console server.

mod channel;
mod session;
mod ws;

pub use channel::*;
pub use session::*;
pub use ws::*;
