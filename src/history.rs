// ============================================================================
// OPERATION LOG — append-only edit history with a cursor
// ============================================================================
//
// The log never mutates recorded operations. Undo and redo only move a cursor
// over them; the pipeline replays the active prefix against the untouched
// original to materialize the current image.
// ============================================================================

use crate::ops::EditOp;

/// Default number of operations retained before the oldest is evicted.
pub const DEFAULT_CAPACITY: usize = 50;

/// Append-only operation history with cursor-based undo/redo.
///
/// `active` counts the operations currently in effect: `entries[..active]` is
/// the active prefix, `entries[active..]` is the redo tail. Appending a new
/// operation discards the redo tail first.
///
/// When the log is full, appending evicts the oldest entry instead of growing.
/// Replay always starts from the untouched original, so an evicted operation
/// drops out of every subsequently replayed state; eviction shortens the
/// recorded history, it does not bake the old edit into a floor state.
#[derive(Clone, Debug)]
pub struct OperationLog {
    entries: Vec<EditOp>,
    active: usize,
    capacity: usize,
}

impl Default for OperationLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl OperationLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            active: 0,
            capacity: capacity.max(1),
        }
    }

    /// Record a new operation at the cursor.
    ///
    /// Any redo tail beyond the cursor is discarded. If the log is at
    /// capacity the oldest entry is evicted and the cursor stays on the new
    /// final entry.
    pub fn append(&mut self, op: EditOp) {
        self.entries.truncate(self.active);
        self.entries.push(op);
        if self.entries.len() > self.capacity {
            self.entries.remove(0);
        } else {
            self.active += 1;
        }
    }

    /// Step the cursor back one operation. Returns the new active prefix, or
    /// `None` if there was nothing to undo.
    pub fn undo(&mut self) -> Option<&[EditOp]> {
        if self.active == 0 {
            return None;
        }
        self.active -= 1;
        Some(&self.entries[..self.active])
    }

    /// Step the cursor forward one operation. Returns the new active prefix,
    /// or `None` if there was nothing to redo.
    pub fn redo(&mut self) -> Option<&[EditOp]> {
        if self.active >= self.entries.len() {
            return None;
        }
        self.active += 1;
        Some(&self.entries[..self.active])
    }

    pub fn can_undo(&self) -> bool {
        self.active > 0
    }

    pub fn can_redo(&self) -> bool {
        self.active < self.entries.len()
    }

    /// The operations currently in effect, oldest first.
    pub fn active_ops(&self) -> &[EditOp] {
        &self.entries[..self.active]
    }

    /// Total recorded operations, including the redo tail.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Maximum number of operations retained before eviction kicks in.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all history, e.g. when a different asset becomes active.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.active = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(value: i32) -> EditOp {
        EditOp::Brightness { value }
    }

    #[test]
    fn starts_empty_with_nothing_to_undo_or_redo() {
        let log = OperationLog::default();
        assert!(!log.can_undo());
        assert!(!log.can_redo());
        assert!(log.active_ops().is_empty());
    }

    #[test]
    fn append_advances_cursor() {
        let mut log = OperationLog::default();
        log.append(b(1));
        log.append(b(2));
        assert_eq!(log.active_ops(), &[b(1), b(2)]);
        assert!(log.can_undo());
        assert!(!log.can_redo());
    }

    #[test]
    fn undo_then_redo_walks_the_cursor() {
        let mut log = OperationLog::default();
        log.append(b(1));
        log.append(b(2));
        log.append(b(3));

        assert_eq!(log.undo().unwrap(), &[b(1), b(2)]);
        assert_eq!(log.undo().unwrap(), &[b(1)]);
        assert!(log.can_redo());
        assert_eq!(log.redo().unwrap(), &[b(1), b(2)]);
        assert_eq!(log.redo().unwrap(), &[b(1), b(2), b(3)]);
        assert!(log.redo().is_none());
    }

    #[test]
    fn undo_at_start_returns_none() {
        let mut log = OperationLog::default();
        assert!(log.undo().is_none());
        log.append(b(1));
        log.undo().unwrap();
        assert!(log.undo().is_none());
    }

    #[test]
    fn append_after_undo_discards_redo_tail() {
        let mut log = OperationLog::default();
        log.append(b(1));
        log.append(b(2));
        log.append(b(3));
        log.undo().unwrap();
        log.undo().unwrap();

        log.append(b(9));
        assert_eq!(log.active_ops(), &[b(1), b(9)]);
        assert!(!log.can_redo());
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn eviction_drops_oldest_and_keeps_cursor_at_end() {
        let mut log = OperationLog::new(2);
        log.append(b(1));
        log.append(b(2));
        log.append(b(3));

        assert_eq!(log.len(), 2);
        assert_eq!(log.active_ops(), &[b(2), b(3)]);
        // Only two undo steps remain; b(1) is gone from the replayed history.
        assert_eq!(log.undo().unwrap(), &[b(2)]);
        assert_eq!(log.undo().unwrap(), &[] as &[EditOp]);
        assert!(log.undo().is_none());
    }

    #[test]
    fn clear_resets_everything() {
        let mut log = OperationLog::default();
        log.append(b(1));
        log.append(b(2));
        log.undo().unwrap();
        log.clear();
        assert!(log.is_empty());
        assert!(!log.can_undo());
        assert!(!log.can_redo());
    }
}
