//! Command history with a navigation cursor.

/// Previously submitted commands, oldest first.
///
/// The cursor ranges over `0..=len()`; `len()` is the fresh empty entry below the newest
/// command.
#[derive(Debug, Clone, Default)]
pub struct CommandHistory {
    entries: Vec<String>,
    cursor: usize,
}

impl CommandHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a submitted command and park the cursor on the empty entry.
    pub fn record(&mut self, command: impl Into<String>) {
        self.entries.push(command.into());
        self.reset_cursor();
    }

    pub fn reset_cursor(&mut self) {
        self.cursor = self.entries.len();
    }

    /// Step to the older entry (stopping at the oldest) and return the input to show.
    pub fn previous(&mut self) -> &str {
        self.cursor = self.cursor.saturating_sub(1);
        self.current()
    }

    /// Step to the newer entry (stopping at the empty entry) and return the input to show.
    pub fn next(&mut self) -> &str {
        self.cursor = (self.cursor + 1).min(self.entries.len());
        self.current()
    }

    /// Entry under the cursor, or "" on the empty entry.
    pub fn current(&self) -> &str {
        self.entries.get(self.cursor).map(String::as_str).unwrap_or("")
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(entries: &[&str]) -> CommandHistory {
        let mut history = CommandHistory::new();
        for entry in entries {
            history.record(*entry);
        }
        history
    }

    #[test]
    fn test_record_parks_cursor_past_end() {
        let history = history(&["ls", "pwd"]);
        assert_eq!(history.cursor(), 2);
        assert_eq!(history.current(), "");
    }

    #[test]
    fn test_previous_twice_then_next() {
        let mut history = history(&["ls", "pwd"]);
        assert_eq!(history.previous(), "pwd");
        assert_eq!(history.previous(), "ls");
        assert_eq!(history.cursor(), 0);
        assert_eq!(history.next(), "pwd");
        assert_eq!(history.cursor(), 1);
    }

    #[test]
    fn test_navigation_clamps() {
        let mut history = history(&["ls"]);
        history.previous();
        assert_eq!(history.previous(), "ls");
        assert_eq!(history.cursor(), 0);

        history.next();
        assert_eq!(history.next(), "");
        assert_eq!(history.cursor(), 1);
    }

    #[test]
    fn test_empty_history_navigation() {
        let mut history = CommandHistory::new();
        assert_eq!(history.previous(), "");
        assert_eq!(history.next(), "");
        assert_eq!(history.cursor(), 0);
    }

    #[test]
    fn test_navigation_never_mutates_entries() {
        let mut history = history(&["a", "b", "c"]);
        for _ in 0..5 {
            history.previous();
        }
        for _ in 0..5 {
            history.next();
        }
        assert_eq!(history.entries(), &["a", "b", "c"]);
    }
}
