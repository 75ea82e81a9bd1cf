//! View-mode stack.

use sandterm_types::ViewMode;

/// Stack of view modes with [`ViewMode::Main`] as its permanent base.
///
/// The only ways to change it are pushing a stream view and popping back to the base,
/// so it can never be empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeStack {
    above_base: Vec<ViewMode>,
}

impl Default for ModeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ModeStack {
    pub fn new() -> Self {
        Self {
            above_base: Vec::new(),
        }
    }

    /// Mode on top of the stack.
    pub fn top(&self) -> ViewMode {
        self.above_base.last().copied().unwrap_or(ViewMode::Main)
    }

    pub fn is_streaming(&self) -> bool {
        self.top() == ViewMode::Stream
    }

    pub fn push_stream(&mut self) {
        self.above_base.push(ViewMode::Stream);
    }

    /// Pop everything above the base. Returns false if already at the base.
    pub fn pop_to_base(&mut self) -> bool {
        let popped = !self.above_base.is_empty();
        self.above_base.clear();
        popped
    }

    pub fn depth(&self) -> usize {
        self.above_base.len() + 1
    }

    /// Modes bottom to top.
    pub fn modes(&self) -> Vec<ViewMode> {
        std::iter::once(ViewMode::Main)
            .chain(self.above_base.iter().copied())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_main() {
        let stack = ModeStack::new();
        assert_eq!(stack.top(), ViewMode::Main);
        assert_eq!(stack.modes(), vec![ViewMode::Main]);
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn test_push_and_pop_to_base() {
        let mut stack = ModeStack::new();
        stack.push_stream();
        assert!(stack.is_streaming());
        assert_eq!(stack.modes(), vec![ViewMode::Main, ViewMode::Stream]);

        assert!(stack.pop_to_base());
        assert_eq!(stack.modes(), vec![ViewMode::Main]);
    }

    #[test]
    fn test_pop_at_base_is_noop() {
        let mut stack = ModeStack::new();
        assert!(!stack.pop_to_base());
        assert_eq!(stack.top(), ViewMode::Main);
        assert_eq!(stack.depth(), 1);
    }
}
