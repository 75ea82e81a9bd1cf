//! Reassembles text from transport chunks.
//!
//! Chunk boundaries fall anywhere: inside a multi-byte character or halfway through an
//! escape sequence. The decoder holds such tails back until the next chunk completes them.

use crate::{ConsoleError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

/// Longest escape prefix held back for the next chunk.
const MAX_HELD_SEQUENCE: usize = 16;

/// An escape sequence cut off at the end of the text.
static PARTIAL_SEQUENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x1b(\[[0-9:<=>?;\-]*|[()])?$").unwrap());

#[derive(Debug, Default)]
pub struct ChunkDecoder {
    pending_bytes: Vec<u8>,
    pending_text: String,
}

impl ChunkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a chunk, returning the text that is ready to interpret.
    ///
    /// Invalid UTF-8 fails with [`ConsoleError::MalformedChunk`] and the chunk is dropped.
    pub fn decode(&mut self, chunk: &[u8]) -> Result<String> {
        let mut bytes = std::mem::take(&mut self.pending_bytes);
        bytes.extend_from_slice(chunk);

        let mut text = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => {
                let error = e.utf8_error();
                if error.error_len().is_some() {
                    return Err(ConsoleError::MalformedChunk(format!(
                        "invalid UTF-8 after {} bytes",
                        error.valid_up_to()
                    )));
                }
                // Incomplete character at the end: keep it for the next chunk.
                let mut bytes = e.into_bytes();
                self.pending_bytes = bytes.split_off(error.valid_up_to());
                String::from_utf8(bytes).map_err(|e| ConsoleError::MalformedChunk(e.to_string()))?
            }
        };

        if !self.pending_text.is_empty() {
            text.insert_str(0, &std::mem::take(&mut self.pending_text));
        }

        if let Some(partial) = PARTIAL_SEQUENCE.find(&text) {
            if partial.len() <= MAX_HELD_SEQUENCE {
                self.pending_text = text.split_off(partial.start());
            }
        }

        Ok(text)
    }

    /// Whether part of an earlier chunk is still held back.
    pub fn has_pending(&self) -> bool {
        !self.pending_bytes.is_empty() || !self.pending_text.is_empty()
    }
}
