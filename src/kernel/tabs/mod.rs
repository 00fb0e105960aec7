//! Ordered tab workspace with a single active tab.
//!
//! Once [`TabRegistry::ensure_tab`] has run the registry never becomes
//! empty: closing the last tab creates a fresh default one.

mod keys;
mod session;
mod tab;

use crate::core::{AutoConfirm, Confirm, SharedClock};
use crate::kernel::event::TabEvent;
use crate::kernel::services::ports::TabConfig;
use crate::kernel::services::EventSink;
use crate::kernel::storage::KeyValueStore;

pub use keys::{TabCommand, TabKeymap};
pub use session::{TabSession, TabSnapshot};
pub use tab::{Tab, TabId};

/// Name of the auto-saved layout.
pub const CURRENT_SESSION: &str = "current";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragState {
    pub id: TabId,
    pub from: usize,
    /// Index currently hovered; `None` outside any valid drop target.
    pub target: Option<usize>,
}

pub struct TabRegistry {
    config: TabConfig,
    clock: SharedClock,
    events: EventSink,
    confirm: Box<dyn Confirm>,
    tabs: Vec<Tab>,
    active: Option<TabId>,
    drag: Option<DragState>,
    next_id: u64,
    /// Bumped on every layout mutation; lets the host auto-save only when needed.
    version: u64,
}

impl TabRegistry {
    /// A `max_tabs` of 0 is raised to 1 so the registry can never be empty.
    pub fn new(mut config: TabConfig, clock: SharedClock) -> Self {
        if config.max_tabs == 0 {
            tracing::warn!("tabs.max_tabs is 0, using 1");
            config.max_tabs = 1;
        }
        Self {
            config,
            clock,
            events: EventSink::detached(),
            confirm: Box::new(AutoConfirm::default()),
            tabs: Vec::new(),
            active: None,
            drag: None,
            next_id: 1,
            version: 0,
        }
    }

    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    pub fn set_confirm(&mut self, confirm: Box<dyn Confirm>) {
        self.confirm = confirm;
    }

    pub fn config(&self) -> &TabConfig {
        &self.config
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn get(&self, id: TabId) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id == id)
    }

    pub fn index_of(&self, id: TabId) -> Option<usize> {
        self.tabs.iter().position(|t| t.id == id)
    }

    pub fn active_id(&self) -> Option<TabId> {
        self.active
    }

    pub fn active_tab(&self) -> Option<&Tab> {
        self.active.and_then(|id| self.get(id))
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active.and_then(|id| self.index_of(id))
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Creates the default tab when the registry is empty.
    pub fn ensure_tab(&mut self) -> Option<TabId> {
        if !self.tabs.is_empty() {
            return None;
        }
        self.create_default()
    }

    /// Appends a tab. Returns `None` once `max_tabs` tabs exist. The first
    /// tab is activated whatever `activate` says.
    pub fn create_tab(
        &mut self,
        title: &str,
        kind: &str,
        activate: bool,
        content: Option<String>,
    ) -> Option<TabId> {
        if self.tabs.len() >= self.config.max_tabs {
            tracing::info!(max_tabs = self.config.max_tabs, "tab limit reached");
            self.events.emit(TabEvent::LimitReached {
                max_tabs: self.config.max_tabs,
            });
            return None;
        }

        let id = TabId::new(self.next_id);
        self.next_id += 1;
        let title = match title.trim() {
            "" => self.config.default_title.clone(),
            t => t.to_string(),
        };
        let kind = match kind.trim() {
            "" => self.config.default_kind.clone(),
            k => k.to_string(),
        };
        self.tabs.push(Tab {
            id,
            title,
            kind,
            content: content.unwrap_or_default(),
            modified: false,
            created_at: self.clock.now_ms(),
        });
        self.touch();
        tracing::debug!(%id, "tab created");
        self.events.emit(TabEvent::Created { id });

        if activate || self.active.is_none() {
            self.activate_tab(id);
        }
        Some(id)
    }

    pub fn activate_tab(&mut self, id: TabId) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        if self.active == Some(id) {
            return true;
        }
        let previous = self.active.replace(id);
        self.touch();
        self.events.emit(TabEvent::Activated { id, previous });
        true
    }

    /// Closes `id`. A modified tab needs confirmation unless `force`.
    /// The active tab hands over to its following neighbor, else the
    /// preceding one.
    pub fn close_tab(&mut self, id: TabId, force: bool) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        if self.tabs[index].modified && !force {
            let prompt = format!(
                "\"{}\" has unsaved changes. Close it anyway?",
                self.tabs[index].title
            );
            if !self.confirm.confirm(&prompt) {
                tracing::debug!(%id, "tab close cancelled");
                return false;
            }
        }

        self.tabs.remove(index);
        if self.drag.is_some_and(|d| d.id == id) {
            self.drag = None;
        }
        self.touch();
        tracing::debug!(%id, "tab closed");
        self.events.emit(TabEvent::Closed { id });

        if self.active == Some(id) {
            self.active = None;
            let neighbor = self
                .tabs
                .get(index)
                .or_else(|| index.checked_sub(1).and_then(|i| self.tabs.get(i)))
                .map(|t| t.id);
            if let Some(neighbor) = neighbor {
                self.activate_tab(neighbor);
            }
        }
        if self.tabs.is_empty() {
            self.create_default();
        }
        true
    }

    /// Moves `id` so that it ends up at `new_index` (clamped).
    pub fn reorder(&mut self, id: TabId, new_index: usize) -> bool {
        let Some(from) = self.index_of(id) else {
            return false;
        };
        let to = new_index.min(self.tabs.len().saturating_sub(1));
        if from == to {
            return false;
        }
        let tab = self.tabs.remove(from);
        self.tabs.insert(to, tab);
        self.touch();
        self.events.emit(TabEvent::Reordered { id, from, to });
        true
    }

    pub fn mark_modified(&mut self, id: TabId, modified: bool) -> bool {
        let Some(tab) = self.tabs.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        if tab.modified != modified {
            tab.modified = modified;
            self.touch();
            self.events.emit(TabEvent::Modified { id, modified });
        }
        true
    }

    pub fn rename(&mut self, id: TabId, title: &str) -> bool {
        let title = title.trim();
        if title.is_empty() {
            return false;
        }
        let Some(tab) = self.tabs.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        if tab.title != title {
            tab.title = title.to_string();
            self.touch();
            self.events.emit(TabEvent::Renamed {
                id,
                title: title.to_string(),
            });
        }
        true
    }

    /// Replaces the panel content and marks the tab modified.
    pub fn update_content(&mut self, id: TabId, content: impl Into<String>) -> bool {
        let Some(tab) = self.tabs.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        tab.content = content.into();
        self.touch();
        self.mark_modified(id, true)
    }

    /// Copies `id` into a new tab placed right after it.
    pub fn duplicate(&mut self, id: TabId) -> Option<TabId> {
        let index = self.index_of(id)?;
        let source = self.tabs[index].clone();
        let copy = self.create_tab(
            &format!("{} (copy)", source.title),
            &source.kind,
            true,
            Some(source.content),
        )?;
        self.reorder(copy, index + 1);
        if source.modified {
            self.mark_modified(copy, true);
        }
        Some(copy)
    }

    // ---- keyboard navigation -------------------------------------------

    pub fn next(&mut self) -> bool {
        self.step(1)
    }

    pub fn previous(&mut self) -> bool {
        self.step(-1)
    }

    pub fn first(&mut self) -> bool {
        self.activate_index(0)
    }

    pub fn last(&mut self) -> bool {
        match self.tabs.len() {
            0 => false,
            len => self.activate_index(len - 1),
        }
    }

    pub fn activate_index(&mut self, index: usize) -> bool {
        match self.tabs.get(index).map(|t| t.id) {
            Some(id) => self.activate_tab(id),
            None => false,
        }
    }

    fn step(&mut self, delta: isize) -> bool {
        let len = self.tabs.len();
        if len <= 1 {
            return false;
        }
        let current = self.active_index().unwrap_or(0) as isize;
        let next = (current + delta).rem_euclid(len as isize) as usize;
        self.activate_index(next)
    }

    /// Runs a keyboard command against the active tab.
    pub fn execute(&mut self, command: TabCommand) -> bool {
        match command {
            TabCommand::New => {
                let title = self.config.default_title.clone();
                let kind = self.config.default_kind.clone();
                self.create_tab(&title, &kind, true, None).is_some()
            }
            TabCommand::Close => match self.active {
                Some(id) => self.close_tab(id, false),
                None => false,
            },
            TabCommand::Next => self.next(),
            TabCommand::Previous => self.previous(),
            TabCommand::First => self.first(),
            TabCommand::Last => self.last(),
            TabCommand::Select(index) => self.activate_index(index),
            TabCommand::Duplicate => match self.active {
                Some(id) => self.duplicate(id).is_some(),
                None => false,
            },
            TabCommand::MoveLeft => match (self.active, self.active_index()) {
                (Some(id), Some(index)) if index > 0 => self.reorder(id, index - 1),
                _ => false,
            },
            TabCommand::MoveRight => match (self.active, self.active_index()) {
                (Some(id), Some(index)) => self.reorder(id, index + 1),
                _ => false,
            },
        }
    }

    // ---- drag and drop -------------------------------------------------

    pub fn begin_drag(&mut self, id: TabId) -> bool {
        let Some(from) = self.index_of(id) else {
            return false;
        };
        self.drag = Some(DragState {
            id,
            from,
            target: None,
        });
        true
    }

    /// Hovering over position `index`; out-of-range positions are not valid
    /// drop targets.
    pub fn drag_over(&mut self, index: usize) -> bool {
        let len = self.tabs.len();
        let Some(drag) = self.drag.as_mut() else {
            return false;
        };
        drag.target = (index < len).then_some(index);
        drag.target.is_some()
    }

    pub fn drag_leave(&mut self) {
        if let Some(drag) = self.drag.as_mut() {
            drag.target = None;
        }
    }

    /// Finishes the gesture. Released outside a valid target, the order is
    /// left unchanged.
    pub fn drop_drag(&mut self) -> bool {
        match self.drag.take() {
            Some(DragState {
                id,
                target: Some(target),
                ..
            }) => self.reorder(id, target),
            _ => false,
        }
    }

    pub fn cancel_drag(&mut self) {
        self.drag = None;
    }

    pub fn drag(&self) -> Option<DragState> {
        self.drag
    }

    // ---- sessions ------------------------------------------------------

    pub fn snapshot(&self, name: &str) -> TabSession {
        TabSession {
            name: name.to_string(),
            tabs: self.tabs.iter().map(TabSnapshot::from).collect(),
            active_tab: self.active,
            timestamp: self.clock.now_ms(),
        }
    }

    /// Saves the current layout as `name`, replacing a session of the same
    /// name. The oldest sessions are dropped beyond `max_sessions`.
    pub fn save_session(&self, store: &mut KeyValueStore, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || name == CURRENT_SESSION {
            return false;
        }
        let mut sessions = session::load_sessions(store);
        sessions.retain(|s| s.name != name);
        sessions.push(self.snapshot(name));
        let overflow = sessions.len().saturating_sub(self.config.max_sessions);
        let sessions = sessions.split_off(overflow);
        let saved = session::store_sessions(store, &sessions);
        if saved {
            tracing::info!(session = name, tabs = self.tabs.len(), "tab session saved");
        }
        saved
    }

    pub fn list_sessions(&self, store: &mut KeyValueStore) -> Vec<TabSession> {
        session::load_sessions(store)
    }

    pub fn find_session(&self, store: &mut KeyValueStore, name: &str) -> Option<TabSession> {
        session::load_sessions(store)
            .into_iter()
            .find(|s| s.name == name)
    }

    pub fn delete_session(&self, store: &mut KeyValueStore, name: &str) -> bool {
        let mut sessions = session::load_sessions(store);
        let before = sessions.len();
        sessions.retain(|s| s.name != name);
        if sessions.len() == before {
            return false;
        }
        session::store_sessions(store, &sessions)
    }

    /// Force-closes every tab and recreates the session's tabs in order.
    /// Tabs receive fresh ids; the active tab is mapped across.
    pub fn restore_session(&mut self, session: &TabSession) -> bool {
        let ids: Vec<TabId> = self.tabs.iter().map(|t| t.id).collect();
        self.drag = None;
        self.active = None;
        self.tabs.clear();
        for id in ids {
            self.events.emit(TabEvent::Closed { id });
        }

        let mut active = None;
        for snapshot in &session.tabs {
            let Some(id) = self.create_tab(
                &snapshot.title,
                &snapshot.kind,
                false,
                Some(snapshot.content.clone()),
            ) else {
                tracing::warn!(session = %session.name, "session has more tabs than allowed, truncating");
                break;
            };
            if snapshot.modified {
                self.mark_modified(id, true);
            }
            if session.active_tab == Some(snapshot.id) {
                active = Some(id);
            }
        }
        if let Some(id) = active {
            self.activate_tab(id);
        }
        self.ensure_tab();
        self.touch();

        tracing::info!(session = %session.name, tabs = self.tabs.len(), "tab session restored");
        self.events.emit(TabEvent::SessionRestored {
            name: session.name.clone(),
            tabs: self.tabs.len(),
        });
        true
    }

    /// Auto-saves the current layout under `tabs:current`.
    pub fn persist(&self, store: &mut KeyValueStore) -> bool {
        session::store_current(store, &self.snapshot(CURRENT_SESSION))
    }

    /// Restores the auto-saved layout, if any.
    pub fn load(&mut self, store: &mut KeyValueStore) -> bool {
        match session::load_current(store) {
            Some(current) if !current.tabs.is_empty() => self.restore_session(&current),
            _ => false,
        }
    }

    fn create_default(&mut self) -> Option<TabId> {
        let title = self.config.default_title.clone();
        let kind = self.config.default_kind.clone();
        self.create_tab(&title, &kind, true, None)
    }

    fn touch(&mut self) {
        self.version = self.version.wrapping_add(1);
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/kernel/tabs/mod.rs"]
mod tests;
