use serde_json::Value;

use crate::core::event::Key;
use crate::kernel::tabs::{TabCommand, TabId};
use crate::kernel::toast::{ToastId, ToastKind};

/// Host input routed through [`super::Platform::dispatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Periodic timer: toast timeouts, storage sweep, external sync.
    Tick,
    /// Window lost focus.
    Blur,
    /// Window regained focus.
    Focus,
    Key(Key),
    Tab(TabCommand),
    CreateTab {
        title: String,
        kind: String,
        activate: bool,
        content: Option<String>,
    },
    ActivateTab(TabId),
    CloseTab {
        id: TabId,
        force: bool,
    },
    ReorderTab {
        id: TabId,
        index: usize,
    },
    UpdateContent {
        id: TabId,
        content: String,
    },
    SaveSession {
        name: String,
    },
    RestoreSession {
        name: String,
    },
    SetProperty {
        target: String,
        property: String,
        value: Value,
    },
    Undo,
    Redo,
    ShowToast {
        message: String,
        kind: ToastKind,
    },
    HideToast(ToastId),
    ClickToast(ToastId),
    HoverToast {
        id: ToastId,
        hovered: bool,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchResult {
    pub state_changed: bool,
}

impl DispatchResult {
    pub fn changed(state_changed: bool) -> Self {
        Self { state_changed }
    }
}
