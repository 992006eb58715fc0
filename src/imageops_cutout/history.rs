use std::collections::VecDeque;

use image::Luma;
use imageproc::definitions::Image;

use crate::error::HistoryError;

/// Snapshots kept by [`MaskHistory::default`]
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// Bounded undo/redo stack of full mask snapshots.
///
/// Every entry is an owned copy; nothing handed out by the history aliases
/// a caller's working buffer. When the stack is full the oldest snapshot is
/// dropped. Pushing after an undo discards the redo branch.
#[derive(Debug, Clone)]
pub struct MaskHistory {
    snapshots: VecDeque<Image<Luma<u8>>>,
    cursor: usize,
    capacity: usize,
}

impl MaskHistory {
    /// Creates an empty history holding at most `capacity` snapshots (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            snapshots: VecDeque::with_capacity(capacity),
            cursor: 0,
            capacity,
        }
    }

    /// Records `mask` as the newest state.
    pub fn push(&mut self, mask: Image<Luma<u8>>) {
        if !self.snapshots.is_empty() {
            self.snapshots.truncate(self.cursor + 1);
        }
        self.snapshots.push_back(mask);
        if self.snapshots.len() > self.capacity {
            self.snapshots.pop_front();
        }
        self.cursor = self.snapshots.len() - 1;
    }

    /// Steps back one snapshot and returns it.
    ///
    /// # Errors
    ///
    /// * `HistoryError::NothingToUndo` - When already at the oldest snapshot
    pub fn undo(&mut self) -> Result<&Image<Luma<u8>>, HistoryError> {
        if !self.can_undo() {
            return Err(HistoryError::NothingToUndo);
        }
        self.cursor -= 1;
        self.current().ok_or(HistoryError::NothingToUndo)
    }

    /// Steps forward one snapshot and returns it.
    ///
    /// # Errors
    ///
    /// * `HistoryError::NothingToRedo` - When already at the newest snapshot
    pub fn redo(&mut self) -> Result<&Image<Luma<u8>>, HistoryError> {
        if !self.can_redo() {
            return Err(HistoryError::NothingToRedo);
        }
        self.cursor += 1;
        self.current().ok_or(HistoryError::NothingToRedo)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    /// Snapshot at the cursor, if anything has been pushed
    pub fn current(&self) -> Option<&Image<Luma<u8>>> {
        self.snapshots.get(self.cursor)
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.cursor = 0;
    }
}

impl Default for MaskHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(value: u8) -> Image<Luma<u8>> {
        Image::from_pixel(2, 2, Luma([value]))
    }

    fn current_level(history: &MaskHistory) -> u8 {
        history.current().unwrap().get_pixel(0, 0)[0]
    }

    #[test]
    fn test_empty_history() {
        let mut history = MaskHistory::default();
        assert!(history.is_empty());
        assert!(history.current().is_none());
        assert_eq!(history.undo(), Err(HistoryError::NothingToUndo));
        assert_eq!(history.redo(), Err(HistoryError::NothingToRedo));
    }

    #[test]
    fn test_undo_redo_walk() {
        let mut history = MaskHistory::new(10);
        for value in [10, 20, 30] {
            history.push(level(value));
        }
        assert_eq!(current_level(&history), 30);
        assert!(!history.can_redo());

        assert_eq!(history.undo().unwrap().get_pixel(0, 0)[0], 20);
        assert_eq!(history.undo().unwrap().get_pixel(0, 0)[0], 10);
        assert!(!history.can_undo());
        assert_eq!(history.undo(), Err(HistoryError::NothingToUndo));

        assert_eq!(history.redo().unwrap().get_pixel(0, 0)[0], 20);
        assert!(history.can_redo());
    }

    #[test]
    fn test_push_discards_redo_branch() {
        let mut history = MaskHistory::new(10);
        history.push(level(1));
        history.push(level(2));
        history.push(level(3));
        history.undo().unwrap();
        history.undo().unwrap();

        history.push(level(9));
        assert_eq!(history.len(), 2);
        assert!(!history.can_redo());
        assert_eq!(history.undo().unwrap().get_pixel(0, 0)[0], 1);
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut history = MaskHistory::new(3);
        for value in 1..=5 {
            history.push(level(value));
        }
        assert_eq!(history.len(), 3);
        history.undo().unwrap();
        history.undo().unwrap();
        assert_eq!(current_level(&history), 3);
        assert!(!history.can_undo());
    }

    #[test]
    fn test_zero_capacity_keeps_one_snapshot() {
        let mut history = MaskHistory::new(0);
        assert_eq!(history.capacity(), 1);
        history.push(level(1));
        history.push(level(2));
        assert_eq!(history.len(), 1);
        assert_eq!(current_level(&history), 2);
    }

    #[test]
    fn test_clear() {
        let mut history = MaskHistory::new(4);
        history.push(level(1));
        history.push(level(2));
        history.clear();
        assert!(history.is_empty());
        assert!(!history.can_undo());
        history.push(level(7));
        assert_eq!(current_level(&history), 7);
    }
}
