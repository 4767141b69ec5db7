//! Undo/redo history using immutable snapshots
//!
//! Every structural mutation records the graph as it was *before* the change.
//! Snapshots are shared through `Arc`, so restoring one and pushing the
//! current state onto the opposite stack never deep-copies more than the
//! graph being replaced.
//!
//! Both stacks are bounded; when either grows past the limit its oldest
//! entry is evicted and can no longer be recovered.

use std::collections::VecDeque;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::types::{GraphEdge, GraphNode};

/// Default number of entries kept on each stack
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// An immutable `{nodes, edges}` snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl GraphSnapshot {
    pub fn new(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Self {
        Self { nodes, edges }
    }
}

/// Linear undo/redo stacks
#[derive(Debug, Clone)]
pub struct History {
    /// Older states, most recent at the back
    past: VecDeque<Arc<GraphSnapshot>>,
    /// Undone states, most recent undo at the front
    future: VecDeque<Arc<GraphSnapshot>>,
    /// Maximum entries per stack
    limit: usize,
}

impl History {
    /// Create a history keeping at most `limit` entries per stack
    pub fn new(limit: usize) -> Self {
        Self {
            past: VecDeque::new(),
            future: VecDeque::new(),
            limit: limit.max(1), // At least one undo step
        }
    }

    /// Record the pre-mutation state of a structural change
    ///
    /// This discards the redo stack: there is no redo past a divergent edit.
    pub fn record(&mut self, before: GraphSnapshot) {
        self.past.push_back(Arc::new(before));
        while self.past.len() > self.limit {
            self.past.pop_front();
        }
        self.future.clear();
    }

    /// Step back: returns the state to restore, saving `current` for redo
    ///
    /// Returns `None` (and keeps `current` untouched) when there is nothing
    /// to undo.
    pub fn undo(&mut self, current: GraphSnapshot) -> Option<Arc<GraphSnapshot>> {
        let previous = self.past.pop_back()?;
        self.future.push_front(Arc::new(current));
        while self.future.len() > self.limit {
            self.future.pop_back();
        }
        Some(previous)
    }

    /// Step forward: returns the state to restore, saving `current` for undo
    pub fn redo(&mut self, current: GraphSnapshot) -> Option<Arc<GraphSnapshot>> {
        let next = self.future.pop_front()?;
        self.past.push_back(Arc::new(current));
        while self.past.len() > self.limit {
            self.past.pop_front();
        }
        Some(next)
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Number of undoable steps
    pub fn past_len(&self) -> usize {
        self.past.len()
    }

    /// Number of redoable steps
    pub fn future_len(&self) -> usize {
        self.future.len()
    }

    /// The oldest state still recoverable
    pub fn oldest(&self) -> Option<&GraphSnapshot> {
        self.past.front().map(|s| s.as_ref())
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Drop both stacks
    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}
