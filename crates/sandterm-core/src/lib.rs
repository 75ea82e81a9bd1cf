//! Console engine for Sandterm: escape interpretation, screen buffers and session control.

mod classifier;
mod console;
mod decoder;
mod error;
mod escape;
mod history;
mod mode;
mod process;
mod render;
mod screen;
mod transport;

pub use classifier::{AllowList, CommandClassifier};
pub use console::{ConsoleSession, InterruptOutcome};
pub use decoder::ChunkDecoder;
pub use error::ConsoleError;
pub use escape::{interpret, Interpreted};
pub use history::CommandHistory;
pub use mode::ModeStack;
pub use process::{PtyChannel, PtyOptions};
pub use render::RenderView;
pub use screen::{Cursor, ScreenBuffer, MAX_CURSOR_TARGET};
pub use transport::{ChannelEvent, Transport};

/// Result type for Sandterm console operations.
pub type Result<T> = std::result::Result<T, ConsoleError>;
