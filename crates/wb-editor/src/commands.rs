//! Undo history.
//!
//! Every mutating store operation pushes a whole-board snapshot before it
//! touches anything; `undo` pops the newest snapshot and the store swaps it
//! in wholesale. There is no redo.
//!
//! Drag gestures use **snapshot batching**: the board is captured once at
//! `begin_batch`, pushes inside the batch are swallowed, and `end_batch`
//! files the captured snapshot as a single step if the board changed.

use std::collections::VecDeque;
use wb_core::BoardState;

/// One undo step: the board as it was before the operation.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub state: BoardState,
    pub description: String,
}

/// Bounded stack of board snapshots with gesture batching.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<Snapshot>,
    /// Maximum undo depth; the oldest entry is dropped past it.
    max_depth: usize,
    /// Batch nesting depth (0 = not batching).
    batch_depth: usize,
    /// Board captured at the start of the outermost batch.
    batch_snapshot: Option<Snapshot>,
}

impl History {
    pub fn new(max_depth: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_depth.min(64)),
            max_depth,
            batch_depth: 0,
            batch_snapshot: None,
        }
    }

    /// Record `state` as the pre-mutation snapshot. Inside a batch this is
    /// a no-op: the batch already holds the snapshot from its start.
    pub fn push(&mut self, state: &BoardState, description: &str) {
        if self.batch_depth > 0 {
            return;
        }
        self.file(Snapshot {
            state: state.clone(),
            description: description.to_string(),
        });
    }

    /// Start a batch group. Only the outermost call captures the board.
    pub fn begin_batch(&mut self, state: &BoardState, description: &str) {
        if self.batch_depth == 0 {
            self.batch_snapshot = Some(Snapshot {
                state: state.clone(),
                description: description.to_string(),
            });
        }
        self.batch_depth += 1;
    }

    /// End a batch group. When the outermost batch closes and `state`
    /// differs from the captured board, one undo step is filed.
    pub fn end_batch(&mut self, state: &BoardState) {
        if self.batch_depth == 0 {
            return;
        }
        self.batch_depth -= 1;
        if self.batch_depth > 0 {
            return;
        }
        if let Some(snapshot) = self.batch_snapshot.take() {
            if snapshot.state != *state {
                self.file(snapshot);
            } else {
                log::trace!("dropping unchanged batch {:?}", snapshot.description);
            }
        }
    }

    pub fn in_batch(&self) -> bool {
        self.batch_depth > 0
    }

    /// Pop the newest snapshot. An open batch is abandoned first.
    pub fn undo(&mut self) -> Option<Snapshot> {
        self.batch_depth = 0;
        self.batch_snapshot = None;
        self.entries.pop_back()
    }

    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.batch_depth = 0;
        self.batch_snapshot = None;
    }

    fn file(&mut self, snapshot: Snapshot) {
        if self.max_depth == 0 {
            return;
        }
        self.entries.push_back(snapshot);
        while self.entries.len() > self.max_depth {
            self.entries.pop_front();
        }
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(wb_core::BoardConfig::default().undo_depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wb_core::{EntityId, Node};

    fn board_with(x: f32) -> BoardState {
        let mut state = BoardState::default();
        state
            .nodes
            .push(Node::new(EntityId::intern("hist_a"), x, 0.0, 100.0, 100.0));
        state
    }

    #[test]
    fn undo_returns_pre_mutation_state() {
        let mut history = History::new(100);
        let before = board_with(0.0);
        history.push(&before, "move");
        let snap = history.undo().unwrap();
        assert_eq!(snap.state, before);
        assert_eq!(snap.description, "move");
        assert!(history.undo().is_none());
    }

    #[test]
    fn max_depth_trims_oldest() {
        let mut history = History::new(3);
        for i in 0..5 {
            history.push(&board_with(i as f32), "move");
        }
        assert_eq!(history.len(), 3);
        let mut xs = Vec::new();
        while let Some(snap) = history.undo() {
            xs.push(snap.state.nodes[0].x);
        }
        assert_eq!(xs, vec![4.0, 3.0, 2.0]);
    }

    #[test]
    fn batch_undo_is_single_step() {
        let mut history = History::new(100);
        let start = board_with(0.0);
        history.begin_batch(&start, "drag");
        for i in 1..=5 {
            history.push(&board_with(i as f32 * 10.0), "move");
        }
        history.end_batch(&board_with(50.0));

        assert_eq!(history.len(), 1);
        assert_eq!(history.undo().unwrap().state, start);
    }

    #[test]
    fn nested_batches_flush_once() {
        let mut history = History::new(100);
        let start = board_with(0.0);
        history.begin_batch(&start, "outer");
        history.begin_batch(&board_with(5.0), "inner");
        history.end_batch(&board_with(5.0));
        assert!(history.is_empty());
        history.end_batch(&board_with(9.0));
        assert_eq!(history.undo().unwrap().description, "outer");
    }

    #[test]
    fn empty_batch_no_undo_entry() {
        let mut history = History::new(100);
        let start = board_with(0.0);
        history.begin_batch(&start, "drag");
        history.end_batch(&start);
        assert!(!history.can_undo());
    }
}
