//! Bounded transition history.
//!
//! Recording is opt-in: a history built with capacity `0` ignores every
//! record, so machines that never ask for history never allocate for it.

use super::definition::{StateId, NONE_STATE};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// How a transition was requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionKind {
    /// Immediate: the new state ran its first tick inside the call.
    Change,
    /// Deferred: the new state runs on the following update.
    Next,
    /// A callback fault redirected into the error state.
    Error,
}

/// Record of a single transition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// State active before the transition, [`NONE_STATE`] on first entry
    pub from: StateId,
    /// State entered
    pub to: StateId,
    pub kind: TransitionKind,
    /// Run count of the session after the transition
    pub run: u32,
    /// When the transition occurred
    pub timestamp: DateTime<Utc>,
}

/// Ring of the most recent transitions, oldest first.
///
/// # Example
///
/// ```rust
/// use action_state::core::{TransitionHistory, TransitionKind, TransitionRecord};
/// use chrono::Utc;
///
/// let mut history = TransitionHistory::with_capacity(2);
/// for (run, to) in [0, 1, 2].into_iter().enumerate() {
///     history.record(TransitionRecord {
///         from: to - 1,
///         to,
///         kind: TransitionKind::Next,
///         run: run as u32 + 1,
///         timestamp: Utc::now(),
///     });
/// }
///
/// assert_eq!(history.len(), 2);
/// assert_eq!(history.path(), vec![0, 1, 2]);
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TransitionHistory {
    capacity: usize,
    records: VecDeque<TransitionRecord>,
}

impl TransitionHistory {
    /// A history that records nothing.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            records: VecDeque::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_enabled(&self) -> bool {
        self.capacity > 0
    }

    /// Append a record, evicting the oldest when full.
    pub fn record(&mut self, record: TransitionRecord) {
        if !self.is_enabled() {
            return;
        }
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    pub fn records(&self) -> impl ExactSizeIterator<Item = &TransitionRecord> {
        self.records.iter()
    }

    pub fn last(&self) -> Option<&TransitionRecord> {
        self.records.back()
    }

    /// Ids visited: the `from` of the oldest retained record, then every `to`.
    ///
    /// A leading [`NONE_STATE`] (first entry) is omitted.
    pub fn path(&self) -> Vec<StateId> {
        let mut path = Vec::with_capacity(self.records.len() + 1);
        if let Some(first) = self.records.front() {
            if first.from != NONE_STATE {
                path.push(first.from);
            }
        }
        path.extend(self.records.iter().map(|r| r.to));
        path
    }

    /// Time between the oldest and newest retained records.
    pub fn duration(&self) -> Option<Duration> {
        let first = self.records.front()?;
        let last = self.records.back()?;
        (last.timestamp - first.timestamp).to_std().ok()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
