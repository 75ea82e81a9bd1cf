//! Escape-sequence interpreter.
//!
//! Replays the control sequences a remote shell emits onto a [`ScreenBuffer`]:
//! - `ESC[2J` clear screen
//! - `ESC[3J` erase scrollback (rows above the cursor)
//! - `ESC[K` erase in line
//! - `ESC[H` cursor home (treated as a clear)
//! - `ESC[<row>;<col>H` absolute cursor position
//! - `ESC(B` and friends, character set selection (stripped only)
//!
//! Everything else, colors included, passes through for the markup renderer.

use crate::screen::{ScreenBuffer, MAX_CURSOR_TARGET};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static CLEAR_SCREEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\x1b\[2J").unwrap());

static ERASE_SCROLLBACK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\x1b\[3J").unwrap());

static ERASE_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\x1b\[K").unwrap());

static CURSOR_HOME: Lazy<Regex> = Lazy::new(|| Regex::new(r"\x1b\[H").unwrap());

/// Parameters are limited to CSI parameter bytes so SGR sequences like `ESC[1;32m`
/// never match.
static CURSOR_POSITION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x1b\[([0-9:<=>?\-]*);([0-9:<=>?\-]*)H").unwrap());

static CHARSET_SELECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\x1b[()][A-Za-z0-9]").unwrap());

/// Result of interpreting one chunk of output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpreted {
    pub buffer: ScreenBuffer,
    /// The chunk with every recognized sequence removed.
    pub display: String,
}

/// Apply `text` to `buffer`.
///
/// The text is handled one newline-separated segment at a time. Sequences found in a
/// segment are applied first, then the remaining visible text is written at the cursor.
/// A newline-terminated segment moves the cursor to the start of the next row; a trailing
/// unterminated segment leaves it after the written text so the next chunk continues the
/// line. Empty text is the remote side's explicit "nothing to show" and empties the buffer.
pub fn interpret(mut buffer: ScreenBuffer, text: &str) -> Interpreted {
    if text.is_empty() {
        buffer.clear();
        return Interpreted {
            buffer,
            display: String::new(),
        };
    }

    let mut display = String::with_capacity(text.len());
    for piece in text.split_inclusive('\n') {
        let (segment, terminated) = match piece.strip_suffix('\n') {
            Some(segment) => (segment.strip_suffix('\r').unwrap_or(segment), true),
            None => (piece, false),
        };

        let visible = apply_sequences(&mut buffer, segment);
        buffer.write(&visible);
        display.push_str(&visible);

        if terminated {
            buffer.new_line();
            display.push('\n');
        }
    }

    Interpreted { buffer, display }
}

fn apply_sequences(buffer: &mut ScreenBuffer, segment: &str) -> String {
    let mut text = segment.to_string();
    if !text.contains('\x1b') {
        return text;
    }

    if strip(&CLEAR_SCREEN, &mut text) {
        buffer.clear();
    }
    if strip(&ERASE_SCROLLBACK, &mut text) {
        buffer.erase_scrollback();
    }
    if strip(&ERASE_LINE, &mut text) {
        buffer.erase_line();
    }
    if strip(&CURSOR_HOME, &mut text) {
        buffer.clear();
    }

    let targets: Vec<Option<(usize, usize)>> = CURSOR_POSITION
        .captures_iter(&text)
        .map(|caps| parse_target(&caps[1], &caps[2]))
        .collect();
    if !targets.is_empty() {
        for target in targets {
            match target {
                Some((row, col)) => buffer.move_to(row, col),
                None => debug!(target: "sandterm::escape", "Ignoring invalid cursor position target"),
            }
        }
        text = CURSOR_POSITION.replace_all(&text, "").into_owned();
    }

    strip(&CHARSET_SELECT, &mut text);
    text
}

/// Remove every match of `pattern`; true if there was one.
fn strip(pattern: &Regex, text: &mut String) -> bool {
    if !pattern.is_match(text) {
        return false;
    }
    *text = pattern.replace_all(text, "").into_owned();
    true
}

/// 1-based sequence coordinates to a 0-based target, `None` when unusable.
fn parse_target(row: &str, col: &str) -> Option<(usize, usize)> {
    let row: usize = row.parse().ok()?;
    let col: usize = col.parse().ok()?;
    if row == 0 || col == 0 || row > MAX_CURSOR_TARGET || col > MAX_CURSOR_TARGET {
        return None;
    }
    Some((row - 1, col - 1))
}
