//! Closed event taxonomy published by the components.

use crate::kernel::services::ports::BackendKind;
use crate::kernel::tabs::TabId;
use crate::kernel::toast::{ToastId, ToastKind};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    /// `set` on this store.
    Local,
    /// Explicit `remove`.
    Removed,
    /// Lazily deleted because its expiry passed.
    Expired,
    /// Written by another process sharing the medium.
    External,
    Cleared,
    Imported,
    /// The synchronous first call of a watcher registered with `immediate`.
    Initial,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StorageEvent {
    Changed {
        backend: BackendKind,
        key: String,
        origin: ChangeOrigin,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToastEvent {
    Created { id: ToastId, kind: ToastKind },
    Grouped { id: ToastId, count: u32 },
    Queued { id: ToastId },
    Promoted { id: ToastId },
    Dropped { id: ToastId },
    Removed { id: ToastId },
}

#[derive(Debug, Clone, PartialEq)]
pub enum TabEvent {
    Created { id: TabId },
    Activated { id: TabId, previous: Option<TabId> },
    Closed { id: TabId },
    Renamed { id: TabId, title: String },
    Modified { id: TabId, modified: bool },
    Reordered { id: TabId, from: usize, to: usize },
    LimitReached { max_tabs: usize },
    SessionRestored { name: String, tabs: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub enum LearningEvent {
    PropertyChanged {
        target: String,
        property: String,
        value: Value,
    },
    ChallengeCompleted {
        id: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlatformEvent {
    Storage(StorageEvent),
    Toast(ToastEvent),
    Tab(TabEvent),
    Learning(LearningEvent),
}

impl PlatformEvent {
    /// Wire name used by page scripts (`tab:created`, `toast:removed`, ...).
    pub fn name(&self) -> &'static str {
        match self {
            PlatformEvent::Storage(StorageEvent::Changed { .. }) => "storage:changed",
            PlatformEvent::Toast(e) => match e {
                ToastEvent::Created { .. } => "toast:created",
                ToastEvent::Grouped { .. } => "toast:grouped",
                ToastEvent::Queued { .. } => "toast:queued",
                ToastEvent::Promoted { .. } => "toast:promoted",
                ToastEvent::Dropped { .. } => "toast:dropped",
                ToastEvent::Removed { .. } => "toast:removed",
            },
            PlatformEvent::Tab(e) => match e {
                TabEvent::Created { .. } => "tab:created",
                TabEvent::Activated { .. } => "tab:activated",
                TabEvent::Closed { .. } => "tab:closed",
                TabEvent::Renamed { .. } => "tab:renamed",
                TabEvent::Modified { .. } => "tab:modified",
                TabEvent::Reordered { .. } => "tab:reordered",
                TabEvent::LimitReached { .. } => "tab:limit",
                TabEvent::SessionRestored { .. } => "tab:session-restored",
            },
            PlatformEvent::Learning(e) => match e {
                LearningEvent::PropertyChanged { .. } => "propertyChanged",
                LearningEvent::ChallengeCompleted { .. } => "challengeCompleted",
            },
        }
    }
}

impl From<StorageEvent> for PlatformEvent {
    fn from(event: StorageEvent) -> Self {
        PlatformEvent::Storage(event)
    }
}

impl From<ToastEvent> for PlatformEvent {
    fn from(event: ToastEvent) -> Self {
        PlatformEvent::Toast(event)
    }
}

impl From<TabEvent> for PlatformEvent {
    fn from(event: TabEvent) -> Self {
        PlatformEvent::Tab(event)
    }
}

impl From<LearningEvent> for PlatformEvent {
    fn from(event: LearningEvent) -> Self {
        PlatformEvent::Learning(event)
    }
}
