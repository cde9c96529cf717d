//! Linear undo/redo history over full snapshots of the box list.
//!
//! The stack is seeded with the state at session start, so undoing all the
//! way back always lands on the list as it was loaded. Depth is capped:
//! when the cap is reached the oldest snapshot is evicted.

use crate::model::AnnotationBox;

pub struct History {
    snapshots: Vec<Vec<AnnotationBox>>,
    cursor: usize,
    limit: usize,
}

impl History {
    pub fn new(initial: Vec<AnnotationBox>, limit: usize) -> Self {
        Self {
            snapshots: vec![initial],
            cursor: 0,
            limit: limit.max(2),
        }
    }

    /// Record the state after a discrete edit. Any redo tail beyond the
    /// cursor is discarded first.
    pub fn push(&mut self, snapshot: Vec<AnnotationBox>) {
        self.snapshots.truncate(self.cursor + 1);
        self.snapshots.push(snapshot);
        if self.snapshots.len() > self.limit {
            self.snapshots.remove(0);
        }
        self.cursor = self.snapshots.len() - 1;
    }

    pub fn undo(&mut self) -> Option<Vec<AnnotationBox>> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        Some(self.snapshots[self.cursor].clone())
    }

    pub fn redo(&mut self) -> Option<Vec<AnnotationBox>> {
        if self.cursor + 1 >= self.snapshots.len() {
            return None;
        }
        self.cursor += 1;
        Some(self.snapshots[self.cursor].clone())
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }
}
