/// Review queue: the ordered batch of photos plus the cursor.
///
/// All operations address the queue's intrinsic order by index. The
/// "unprocessed first" list shown to the operator is a derived view
/// (`display_order`) and never feeds back into these indices.

use tracing::debug;

use super::data::{ImageRecord, RecordId};

#[derive(Debug, Default)]
pub struct ReviewQueue {
    records: Vec<ImageRecord>,
    /// `Some(i)` with `i < records.len()` iff the queue is non-empty
    cursor: Option<usize>,
    processed_count: usize,
    next_id: u64,
}

impl ReviewQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the queue wholesale. Cursor goes to 0, or none if empty.
    pub fn load(&mut self, filenames: Vec<String>, processed_count: usize) {
        self.records = filenames
            .into_iter()
            .map(|name| {
                let id = RecordId(self.next_id);
                self.next_id += 1;
                ImageRecord::new(id, name)
            })
            .collect();
        self.processed_count = processed_count;
        self.cursor = if self.records.is_empty() { None } else { Some(0) };

        debug!(
            "Queue loaded: {} images, {} already processed",
            self.records.len(),
            processed_count
        );
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ImageRecord] {
        &self.records
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn current(&self) -> Option<&ImageRecord> {
        self.cursor.and_then(|i| self.records.get(i))
    }

    /// Intrinsic index of a record, if it is still queued
    pub fn position(&self, id: RecordId) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }

    pub fn processed_count(&self) -> usize {
        self.processed_count
    }

    pub fn mark_processed(&mut self) {
        self.processed_count += 1;
    }

    /// Move the cursor to `index`. Out-of-bounds is a no-op returning `None`.
    pub fn select(&mut self, index: usize) -> Option<&ImageRecord> {
        if index >= self.records.len() {
            return None;
        }
        self.cursor = Some(index);
        self.records.get(index)
    }

    /// Step forward, clamped at the last record. Returns whether it moved.
    pub fn advance(&mut self) -> bool {
        match self.cursor {
            Some(i) if i + 1 < self.records.len() => {
                self.cursor = Some(i + 1);
                true
            }
            _ => false,
        }
    }

    /// Step back, clamped at the first record. Returns whether it moved.
    pub fn retreat(&mut self) -> bool {
        match self.cursor {
            Some(i) if i > 0 => {
                self.cursor = Some(i - 1);
                true
            }
            _ => false,
        }
    }

    /// Swap in a new filename after the backend renamed the file on disk.
    /// The record keeps its id and the cursor does not move.
    pub fn replace_at(&mut self, index: usize, filename: impl Into<String>) -> bool {
        match self.records.get_mut(index) {
            Some(record) => {
                record.filename = filename.into();
                true
            }
            None => false,
        }
    }

    /// Drop a record after delete and re-settle the cursor.
    ///
    /// Removing the cursor's record leaves the cursor numerically in place
    /// (now on the following record) unless it was the last one, in which
    /// case it moves to the new last index. Removing an earlier record
    /// shifts the cursor so it stays on the same record.
    pub fn remove_at(&mut self, index: usize) -> Option<ImageRecord> {
        if index >= self.records.len() {
            return None;
        }
        let removed = self.records.remove(index);

        self.cursor = match self.cursor {
            _ if self.records.is_empty() => None,
            Some(c) if index < c => Some(c - 1),
            Some(c) => Some(c.min(self.records.len() - 1)),
            None => Some(0),
        };

        Some(removed)
    }

    /// Intrinsic indices in presentation order: unprocessed before
    /// processed, then by filename, then by id.
    pub fn display_order<F>(&self, is_processed: F) -> Vec<usize>
    where
        F: Fn(&ImageRecord) -> bool,
    {
        let mut keyed: Vec<(bool, &str, RecordId, usize)> = self
            .records
            .iter()
            .enumerate()
            .map(|(i, r)| (is_processed(r), r.filename.as_str(), r.id, i))
            .collect();
        keyed.sort();
        keyed.into_iter().map(|(_, _, _, i)| i).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn assert_cursor_invariant(queue: &ReviewQueue) {
        match queue.cursor() {
            Some(c) => assert!(c < queue.len(), "cursor {} out of {}", c, queue.len()),
            None => assert!(queue.is_empty()),
        }
        if !queue.is_empty() {
            assert!(queue.cursor().is_some());
        }
    }

    #[test]
    fn test_load_resets_cursor() {
        let mut queue = ReviewQueue::new();
        queue.load(names(&["a.jpg", "b.jpg"]), 1);
        assert_eq!(queue.cursor(), Some(0));
        assert_eq!(queue.processed_count(), 1);

        queue.load(Vec::new(), 0);
        assert_eq!(queue.cursor(), None);
        assert!(queue.current().is_none());
    }

    #[test]
    fn test_ids_are_not_reused_across_loads() {
        let mut queue = ReviewQueue::new();
        queue.load(names(&["a.jpg"]), 0);
        let first = queue.records()[0].id;
        queue.load(names(&["a.jpg"]), 0);
        assert_ne!(queue.records()[0].id, first);
    }

    #[test]
    fn test_select_out_of_bounds_is_noop() {
        let mut queue = ReviewQueue::new();
        queue.load(names(&["a.jpg", "b.jpg"]), 0);
        queue.select(1);
        assert!(queue.select(2).is_none());
        assert_eq!(queue.cursor(), Some(1));
    }

    #[test]
    fn test_advance_and_retreat_clamp() {
        let mut queue = ReviewQueue::new();
        queue.load(names(&["a.jpg", "b.jpg"]), 0);
        assert!(!queue.retreat());
        assert!(queue.advance());
        assert!(!queue.advance());
        assert_eq!(queue.cursor(), Some(1));
        assert!(queue.retreat());
        assert_eq!(queue.cursor(), Some(0));
    }

    #[test]
    fn test_replace_keeps_cursor_and_id() {
        let mut queue = ReviewQueue::new();
        queue.load(names(&["a.jpg", "b.jpg"]), 0);
        queue.select(1);
        let id = queue.records()[1].id;
        assert!(queue.replace_at(1, "DONE_AB12C3_b.jpg"));
        assert_eq!(queue.cursor(), Some(1));
        assert_eq!(queue.current().map(|r| r.id), Some(id));
        assert_eq!(queue.current().map(|r| r.filename.as_str()), Some("DONE_AB12C3_b.jpg"));
        assert!(!queue.replace_at(5, "x.jpg"));
    }

    #[test]
    fn test_remove_last_moves_cursor_back() {
        let mut queue = ReviewQueue::new();
        queue.load(names(&["a.jpg", "b.jpg", "c.jpg"]), 0);
        queue.select(2);
        queue.remove_at(2);
        assert_eq!(queue.cursor(), Some(1));
        assert_eq!(queue.current().map(|r| r.filename.as_str()), Some("b.jpg"));
    }

    #[test]
    fn test_remove_middle_keeps_index() {
        let mut queue = ReviewQueue::new();
        queue.load(names(&["a.jpg", "b.jpg", "c.jpg"]), 0);
        queue.select(1);
        queue.remove_at(1);
        assert_eq!(queue.cursor(), Some(1));
        assert_eq!(queue.current().map(|r| r.filename.as_str()), Some("c.jpg"));
    }

    #[test]
    fn test_remove_only_item_empties_cursor() {
        let mut queue = ReviewQueue::new();
        queue.load(names(&["a.jpg"]), 0);
        queue.remove_at(0);
        assert_eq!(queue.cursor(), None);
        assert!(queue.remove_at(0).is_none());
    }

    #[test]
    fn test_remove_before_cursor_tracks_record() {
        let mut queue = ReviewQueue::new();
        queue.load(names(&["a.jpg", "b.jpg", "c.jpg"]), 0);
        queue.select(2);
        queue.remove_at(0);
        assert_eq!(queue.current().map(|r| r.filename.as_str()), Some("c.jpg"));
    }

    #[test]
    fn test_cursor_invariant_under_operation_sequence() {
        let mut queue = ReviewQueue::new();
        queue.load(names(&["a", "b", "c", "d", "e"]), 0);

        // Deterministic mix of every cursor-moving operation
        for step in 0..40usize {
            match step % 6 {
                0 => {
                    queue.advance();
                }
                1 => {
                    queue.select(step % 7);
                }
                2 => {
                    queue.retreat();
                }
                3 if step % 4 == 3 => {
                    let target = queue.cursor().unwrap_or(0);
                    queue.remove_at(target);
                }
                4 => {
                    queue.remove_at(step % 3);
                }
                _ => {
                    queue.advance();
                    queue.advance();
                }
            }
            assert_cursor_invariant(&queue);
        }
        assert!(queue.is_empty());
        assert_eq!(queue.cursor(), None);
    }

    #[test]
    fn test_display_order_unprocessed_first() {
        let mut queue = ReviewQueue::new();
        queue.load(names(&["d.jpg", "DONE_AAAAAA_b.jpg", "a.jpg", "c.jpg"]), 0);
        let order = queue.display_order(|r| r.filename.starts_with("DONE_") || r.filename == "a.jpg");
        let shown: Vec<&str> = order
            .iter()
            .map(|&i| queue.records()[i].filename.as_str())
            .collect();
        assert_eq!(shown, vec!["c.jpg", "d.jpg", "DONE_AAAAAA_b.jpg", "a.jpg"]);
    }

    #[test]
    fn test_display_order_handles_repeated_names() {
        let mut queue = ReviewQueue::new();
        queue.load(names(&["x.jpg", "x.jpg"]), 0);
        assert_eq!(queue.display_order(|_| false), vec![0, 1]);
    }
}
