//! Bounded undo history.
//!
//! Every board mutation first pushes a deep copy of the full
//! [`BoardState`] tagged with the action about to be applied. Undo pops the
//! latest snapshot and replaces the live state wholesale; it never replays
//! operations in reverse. When the history is full the oldest snapshot is
//! dropped silently.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

use crate::models::BoardState;

/// Default number of retained snapshots.
pub const DEFAULT_UNDO_CAPACITY: usize = 20;

/// The command a snapshot precedes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UndoAction {
    CreateJob,
    UpdateJob,
    SetJobTime,
    DeleteJob,
    CloneJob,
    ToggleFinished,
    MoveJob,
    ResizeJob,
    AddLabel,
    RenameLabel,
    DeleteLabel,
    Import,
}

impl UndoAction {
    /// Human-readable label for notices.
    pub fn label(self) -> &'static str {
        match self {
            Self::CreateJob => "create job",
            Self::UpdateJob => "edit job",
            Self::SetJobTime => "edit time",
            Self::DeleteJob => "delete job",
            Self::CloneJob => "duplicate job",
            Self::ToggleFinished => "toggle finished",
            Self::MoveJob => "move job",
            Self::ResizeJob => "resize job",
            Self::AddLabel => "add label",
            Self::RenameLabel => "rename label",
            Self::DeleteLabel => "delete label",
            Self::Import => "import",
        }
    }
}

impl fmt::Display for UndoAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// State captured immediately before an action.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub action: UndoAction,
    pub taken_at: DateTime<Utc>,
    pub state: BoardState,
}

impl Snapshot {
    pub fn new(action: UndoAction, state: BoardState) -> Self {
        Self {
            action,
            taken_at: Utc::now(),
            state,
        }
    }
}

/// Stack of snapshots with a fixed capacity.
#[derive(Debug, Clone)]
pub struct UndoHistory {
    entries: VecDeque<Snapshot>,
    capacity: usize,
}

impl Default for UndoHistory {
    fn default() -> Self {
        Self::new(DEFAULT_UNDO_CAPACITY)
    }
}

impl UndoHistory {
    /// Creates an empty history. A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Pushes a snapshot, evicting the oldest when full.
    pub fn push(&mut self, snapshot: Snapshot) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(snapshot);
    }

    /// Removes and returns the most recent snapshot.
    pub fn pop(&mut self) -> Option<Snapshot> {
        self.entries.pop_back()
    }

    /// The most recent snapshot, if any.
    pub fn peek(&self) -> Option<&Snapshot> {
        self.entries.back()
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

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Actions in the history, most recent first.
    pub fn summary(&self) -> Vec<UndoAction> {
        self.entries.iter().rev().map(|s| s.action).collect()
    }
}
