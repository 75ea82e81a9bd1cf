//! What the display layer reads from a console.

use crate::screen::ScreenBuffer;
use sandterm_types::{ConnectionState, ViewMode, WsServerMessage};

/// Borrowed, read-only snapshot of a console for one render pass.
#[derive(Debug, Clone, Copy)]
pub struct RenderView<'a> {
    buffer: &'a ScreenBuffer,
    mode: ViewMode,
    input: &'a str,
    state: &'a ConnectionState,
}

impl<'a> RenderView<'a> {
    pub fn new(
        buffer: &'a ScreenBuffer,
        mode: ViewMode,
        input: &'a str,
        state: &'a ConnectionState,
    ) -> Self {
        Self {
            buffer,
            mode,
            input,
            state,
        }
    }

    /// Lines of the buffer selected by the current mode, top to bottom.
    pub fn lines(&self) -> impl Iterator<Item = &'a str> + 'a {
        self.buffer.lines().iter().map(String::as_str)
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    /// The prompt is shown only in the main view.
    pub fn show_prompt(&self) -> bool {
        self.mode == ViewMode::Main
    }

    pub fn input(&self) -> &'a str {
        self.input
    }

    pub fn state(&self) -> &'a ConnectionState {
        self.state
    }

    /// Owned frame for the browser.
    pub fn to_frame(&self) -> WsServerMessage {
        WsServerMessage::Frame {
            mode: self.mode,
            show_prompt: self.show_prompt(),
            lines: self.lines().map(str::to_string).collect(),
            input: self.input.to_string(),
            state: self.state.clone(),
        }
    }
}
