//! Line buffer with a write cursor.
//!
//! A `ScreenBuffer` is the logical screen of a console: an ordered list of text lines
//! plus the position the next write lands on. Rows between the last line and the cursor
//! are materialized as empty strings, never left missing.

/// Largest row or column a cursor move may target.
pub const MAX_CURSOR_TARGET: usize = 9_999;

/// Write position inside a [`ScreenBuffer`], 0-based.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    pub row: usize,
    pub col: usize,
}

impl Cursor {
    pub const HOME: Cursor = Cursor { row: 0, col: 0 };

    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScreenBuffer {
    lines: Vec<String>,
    cursor: Cursor,
}

impl ScreenBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a buffer holding `lines`, with the cursor on the row after the last line.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lines: Vec<String> = lines.into_iter().map(Into::into).collect();
        let cursor = Cursor::new(lines.len(), 0);
        Self { lines, cursor }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line(&self, row: usize) -> Option<&str> {
        self.lines.get(row).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Drop every line and home the cursor.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.cursor = Cursor::HOME;
    }

    /// Drop all rows above the cursor row; the cursor row becomes row 0.
    pub fn erase_scrollback(&mut self) {
        let keep_from = self.cursor.row.min(self.lines.len());
        self.lines.drain(..keep_from);
        self.cursor = Cursor::HOME;
    }

    /// Blank the cursor row and return to column 0.
    pub fn erase_line(&mut self) {
        if let Some(line) = self.lines.get_mut(self.cursor.row) {
            line.clear();
        }
        self.cursor.col = 0;
    }

    /// Move the cursor, padding with empty rows when `row` is past the end.
    pub fn move_to(&mut self, row: usize, col: usize) {
        self.pad_through(row);
        self.cursor = Cursor::new(row, col);
    }

    /// Overwrite at the cursor.
    ///
    /// Content before the cursor column is kept (space-filled if the line is shorter),
    /// `text` is spliced in and whatever followed on the old line is dropped. The cursor
    /// column moves past the written text. An empty write still cuts an existing row at the
    /// cursor column, but adds no row past the end.
    pub fn write(&mut self, text: &str) {
        let Cursor { row, col } = self.cursor;
        if text.is_empty() {
            if let Some(line) = self.lines.get_mut(row) {
                if let Some((cut, _)) = line.char_indices().nth(col) {
                    line.truncate(cut);
                }
            }
            return;
        }
        self.pad_through(row);

        let line = &mut self.lines[row];
        let mut spliced: String = line.chars().take(col).collect();
        let kept = spliced.chars().count();
        spliced.extend(std::iter::repeat(' ').take(col - kept));
        spliced.push_str(text);
        *line = spliced;

        self.cursor.col = col + text.chars().count();
    }

    /// Finish the cursor row and move to the start of the next one.
    pub fn new_line(&mut self) {
        self.pad_through(self.cursor.row);
        self.cursor = Cursor::new(self.cursor.row + 1, 0);
    }

    /// Write `text` as a complete line of its own, ending any partial line first.
    pub fn push_line(&mut self, text: &str) {
        if self.cursor.col > 0 {
            self.new_line();
        }
        self.write(text);
        self.new_line();
    }

    fn pad_through(&mut self, row: usize) {
        if self.lines.len() <= row {
            self.lines.resize(row + 1, String::new());
        }
    }
}
