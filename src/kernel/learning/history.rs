use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::policy::UndoPolicy;
use crate::kernel::services::ports::UndoAction;

/// One edit of a playground property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyChange {
    /// Element or component being styled (`button`, `card`, ...).
    pub target: String,
    /// CSS property or control name.
    pub property: String,
    pub old: Value,
    pub new: Value,
    pub at: u64,
}

impl PropertyChange {
    pub fn new(
        target: impl Into<String>,
        property: impl Into<String>,
        old: Value,
        new: Value,
        at: u64,
    ) -> Self {
        Self {
            target: target.into(),
            property: property.into(),
            old,
            new,
            at,
        }
    }

    /// `<target>.<property>`
    pub fn path(&self) -> String {
        format!("{}.{}", self.target, self.property)
    }

    fn same_property(&self, other: &PropertyChange) -> bool {
        self.target == other.target && self.property == other.property
    }
}

/// Undo/redo stacks of property edits, filtered by an [`UndoPolicy`].
pub struct PropertyHistory {
    policy: UndoPolicy,
    max_depth: usize,
    undo: VecDeque<PropertyChange>,
    redo: Vec<PropertyChange>,
}

impl PropertyHistory {
    pub fn new(policy: UndoPolicy, max_depth: usize) -> Self {
        Self {
            policy,
            max_depth: max_depth.max(1),
            undo: VecDeque::new(),
            redo: Vec::new(),
        }
    }

    pub fn policy(&self) -> &UndoPolicy {
        &self.policy
    }

    /// Returns whether the change entered the history (new entry or merged
    /// into the previous one). A recorded change clears the redo stack.
    pub fn record(&mut self, change: PropertyChange) -> bool {
        if change.old == change.new {
            return false;
        }
        match self.policy.decide(&change.target, &change.property) {
            UndoAction::Skip => false,
            UndoAction::Coalesce { window_ms } => {
                if let Some(last) = self.undo.back_mut() {
                    if last.same_property(&change) && change.at.saturating_sub(last.at) <= window_ms {
                        last.new = change.new;
                        last.at = change.at;
                        if last.old == last.new {
                            self.undo.pop_back();
                        }
                        self.redo.clear();
                        return true;
                    }
                }
                self.push(change);
                true
            }
            UndoAction::Record => {
                self.push(change);
                true
            }
        }
    }

    /// Pops the latest change; the caller re-applies its `old` value.
    pub fn undo(&mut self) -> Option<PropertyChange> {
        let change = self.undo.pop_back()?;
        self.redo.push(change.clone());
        Some(change)
    }

    /// Re-pops an undone change; the caller re-applies its `new` value.
    pub fn redo(&mut self) -> Option<PropertyChange> {
        let change = self.redo.pop()?;
        self.undo.push_back(change.clone());
        Some(change)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn len(&self) -> usize {
        self.undo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.undo.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    fn push(&mut self, change: PropertyChange) {
        self.redo.clear();
        self.undo.push_back(change);
        while self.undo.len() > self.max_depth {
            self.undo.pop_front();
        }
    }
}
