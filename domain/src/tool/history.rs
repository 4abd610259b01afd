//! Bounded linear undo/redo history
//!
//! Every editor tool keeps its snapshots in a [`HistoryStack`]. The stack is
//! linear: pushing while the cursor is behind the tail discards the forward
//! entries, and once `max_len` is exceeded the oldest entries are evicted.
//!
//! ```text
//! push A, B, C         [A, B, C]   cursor → C
//! undo                 [A, B, C]   cursor → B
//! push D               [A, B, D]   cursor → D   (C dropped)
//! ```

/// Default number of snapshots kept per tool.
pub const DEFAULT_MAX_HISTORY: usize = 50;

#[derive(Debug, Clone)]
pub struct HistoryStack<T> {
    entries: Vec<T>,
    index: usize,
    max_len: usize,
}

impl<T: Clone> HistoryStack<T> {
    pub fn new(max_len: usize) -> Self {
        Self {
            entries: Vec::new(),
            index: 0,
            max_len: max_len.max(1),
        }
    }

    /// Drop all entries and start over from a single snapshot.
    pub fn reset(&mut self, initial: T) {
        self.entries.clear();
        self.entries.push(initial);
        self.index = 0;
    }

    /// Record a new snapshot after the cursor.
    pub fn push(&mut self, state: T) {
        if !self.entries.is_empty() {
            self.entries.truncate(self.index + 1);
        }
        self.entries.push(state);

        if self.entries.len() > self.max_len {
            let excess = self.entries.len() - self.max_len;
            self.entries.drain(..excess);
        }
        self.index = self.entries.len() - 1;
    }

    /// Move the cursor back and return the snapshot it now points at.
    pub fn undo(&mut self) -> Option<&T> {
        if self.index == 0 || self.entries.is_empty() {
            return None;
        }
        self.index -= 1;
        self.entries.get(self.index)
    }

    /// Move the cursor forward and return the snapshot it now points at.
    pub fn redo(&mut self) -> Option<&T> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        self.entries.get(self.index)
    }

    pub fn current(&self) -> Option<&T> {
        self.entries.get(self.index)
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0 && !self.entries.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cursor position, `None` while the stack is empty.
    pub fn index(&self) -> Option<usize> {
        (!self.entries.is_empty()).then_some(self.index)
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn entries(&self) -> &[T] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index = 0;
    }
}

impl<T: Clone> Default for HistoryStack<T> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_after_undo_truncates_forward_history() {
        let mut history = HistoryStack::default();
        history.push("A");
        history.push("B");
        history.push("C");

        assert_eq!(history.undo(), Some(&"B"));
        history.push("D");

        assert_eq!(history.entries(), &["A", "B", "D"]);
        assert!(!history.can_redo());
        assert_eq!(history.current(), Some(&"D"));
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut history = HistoryStack::default();
        history.push(1);
        history.push(2);

        assert_eq!(history.undo(), Some(&1));
        assert_eq!(history.undo(), None);
        assert_eq!(history.redo(), Some(&2));
        assert_eq!(history.redo(), None);
    }

    #[test]
    fn test_oldest_entries_evicted() {
        let mut history = HistoryStack::new(3);
        for i in 0..5 {
            history.push(i);
        }
        assert_eq!(history.entries(), &[2, 3, 4]);
        assert_eq!(history.index(), Some(2));
    }

    #[test]
    fn test_reset_starts_over() {
        let mut history = HistoryStack::default();
        history.push("old");
        history.push("older");
        history.reset("fresh");
        assert_eq!(history.len(), 1);
        assert!(!history.can_undo());
        assert_eq!(history.current(), Some(&"fresh"));
    }

    #[test]
    fn test_empty_stack() {
        let mut history: HistoryStack<u8> = HistoryStack::default();
        assert!(history.is_empty());
        assert_eq!(history.index(), None);
        assert_eq!(history.undo(), None);
        assert_eq!(history.redo(), None);
    }
}
