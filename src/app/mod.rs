//! Application context: owns the components and wires them together.
//!
//! - capacity failures (tab limit) and completed challenges become toasts
//! - window blur/focus pauses and resumes toast timers
//! - `Tick` drives toast timeouts, the storage sweep and external sync
//! - tab layout changes are auto-saved when enabled

mod action;

use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::core::event::{Key, KeyCode};
use crate::core::{Confirm, SharedClock, SharedConfirm};
use crate::kernel::event::{LearningEvent, PlatformEvent, TabEvent};
use crate::kernel::learning::{
    default_challenges, ChallengeTracker, PropertyChange, PropertyHistory, UndoPolicy,
};
use crate::kernel::services::ports::Settings;
use crate::kernel::services::{event_bus, EventBusReceiver, EventBusSender, EventSink};
use crate::kernel::storage::KeyValueStore;
use crate::kernel::tabs::{TabKeymap, TabRegistry};
use crate::kernel::toast::{NotificationQueue, ToastKind, ToastOptions};

pub use action::{Action, DispatchResult};

pub struct Platform {
    clock: SharedClock,
    store: KeyValueStore,
    toasts: NotificationQueue,
    tabs: TabRegistry,
    keymap: TabKeymap,
    history: PropertyHistory,
    challenges: ChallengeTracker,
    /// Current playground values keyed by `<target>.<property>`.
    properties: FxHashMap<String, Value>,
    events_tx: EventBusSender,
    events_rx: EventBusReceiver,
    pending: Vec<PlatformEvent>,
    auto_save: bool,
    saved_version: u64,
    cleanup_interval_ms: u64,
    last_cleanup: u64,
}

impl Platform {
    pub fn init(settings: Settings, clock: SharedClock) -> Self {
        let (events_tx, events_rx) = event_bus();
        let sink = EventSink::new(events_tx.clone());

        let cleanup_interval_ms = settings.storage.cleanup_interval_ms;
        let mut store =
            KeyValueStore::new(settings.storage, clock.clone()).with_events(sink.clone());
        let toasts =
            NotificationQueue::new(settings.notifications, clock.clone()).with_events(sink.clone());
        let auto_save = settings.tabs.auto_save;
        let mut tabs = TabRegistry::new(settings.tabs, clock.clone()).with_events(sink);
        let keymap = TabKeymap::from_rules(&settings.keybindings);
        let history = PropertyHistory::new(
            UndoPolicy::from_config(&settings.history),
            settings.history.max_depth,
        );

        let challenges = if settings.challenges.is_empty() {
            default_challenges()
        } else {
            settings.challenges
        };
        let mut challenges = ChallengeTracker::new(challenges);
        challenges.load(&mut store);

        let restored = tabs.load(&mut store);
        tabs.ensure_tab();
        let saved_version = tabs.version();

        let now = clock.now_ms();
        let mut platform = Self {
            clock,
            store,
            toasts,
            tabs,
            keymap,
            history,
            challenges,
            properties: FxHashMap::default(),
            events_tx,
            events_rx,
            pending: Vec::new(),
            auto_save,
            saved_version,
            cleanup_interval_ms,
            last_cleanup: now,
        };

        if !platform.store.is_available(None) {
            platform.toasts.show(
                "Storage is unavailable; changes will not be saved",
                ToastKind::Warning,
                ToastOptions::new(),
            );
        }
        platform.pump();

        tracing::info!(
            namespace = platform.store.namespace(),
            tabs = platform.tabs.len(),
            restored,
            "platform initialized"
        );
        platform
    }

    /// Saves the tab layout and drops expired entries.
    pub fn teardown(mut self) -> Vec<PlatformEvent> {
        if self.auto_save {
            self.tabs.persist(&mut self.store);
        }
        let swept = self.store.sweep();
        tracing::info!(swept, "platform teardown");
        self.drain_events()
    }

    /// Applies one host action. Events it produced are collected for
    /// [`Self::drain_events`].
    pub fn dispatch(&mut self, action: Action) -> DispatchResult {
        tracing::trace!(?action, "dispatch");
        let changed = match action {
            Action::Tick => self.tick(),
            Action::Blur => {
                self.toasts.pause_all();
                true
            }
            Action::Focus => {
                self.toasts.resume_all();
                true
            }
            Action::Key(key) => self.handle_key(key),
            Action::Tab(command) => self.tabs.execute(command),
            Action::CreateTab {
                title,
                kind,
                activate,
                content,
            } => self
                .tabs
                .create_tab(&title, &kind, activate, content)
                .is_some(),
            Action::ActivateTab(id) => self.tabs.activate_tab(id),
            Action::CloseTab { id, force } => self.tabs.close_tab(id, force),
            Action::ReorderTab { id, index } => self.tabs.reorder(id, index),
            Action::UpdateContent { id, content } => self.tabs.update_content(id, content),
            Action::SaveSession { name } => self.save_session(&name),
            Action::RestoreSession { name } => self.restore_session(&name),
            Action::SetProperty {
                target,
                property,
                value,
            } => self.set_property(&target, &property, value),
            Action::Undo => self.undo(),
            Action::Redo => self.redo(),
            Action::ShowToast { message, kind } => {
                self.toasts.show(message, kind, ToastOptions::new());
                true
            }
            Action::HideToast(id) => self.toasts.hide(id),
            Action::ClickToast(id) => self.toasts.click(id),
            Action::HoverToast { id, hovered } => {
                if hovered {
                    self.toasts.pause(id)
                } else {
                    self.toasts.resume(id)
                }
            }
        };
        self.auto_save();
        self.pump();
        DispatchResult::changed(changed)
    }

    /// Events published since the last call, in order.
    pub fn drain_events(&mut self) -> Vec<PlatformEvent> {
        self.pump();
        std::mem::take(&mut self.pending)
    }

    /// Sender for host-side publishers sharing the bus.
    pub fn event_sender(&self) -> EventBusSender {
        self.events_tx.clone()
    }

    /// Installs one prompt for both dirty-tab closing and store `clear`.
    pub fn set_confirm(&mut self, confirm: Box<dyn Confirm>) {
        let shared = SharedConfirm::new(confirm);
        self.store.set_confirm(Box::new(shared.clone()));
        self.tabs.set_confirm(Box::new(shared));
    }

    pub fn store(&self) -> &KeyValueStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut KeyValueStore {
        &mut self.store
    }

    pub fn toasts(&self) -> &NotificationQueue {
        &self.toasts
    }

    pub fn toasts_mut(&mut self) -> &mut NotificationQueue {
        &mut self.toasts
    }

    pub fn tabs(&self) -> &TabRegistry {
        &self.tabs
    }

    pub fn keymap(&self) -> &TabKeymap {
        &self.keymap
    }

    pub fn history(&self) -> &PropertyHistory {
        &self.history
    }

    pub fn challenges(&self) -> &ChallengeTracker {
        &self.challenges
    }

    pub fn property(&self, target: &str, property: &str) -> Option<&Value> {
        self.properties.get(&format!("{}.{}", target, property))
    }

    fn tick(&mut self) -> bool {
        let now = self.clock.now_ms();
        let expired = self.toasts.tick();
        let mut changed = !expired.is_empty();

        if self.cleanup_interval_ms > 0
            && now.saturating_sub(self.last_cleanup) >= self.cleanup_interval_ms
        {
            self.last_cleanup = now;
            changed |= self.store.sweep() > 0;
        }
        changed |= self.store.sync_external() > 0;
        changed
    }

    fn handle_key(&mut self, key: Key) -> bool {
        if let Some(command) = self.keymap.resolve(&key) {
            return self.tabs.execute(command);
        }
        if key == Key::ctrl(KeyCode::Char('z')) {
            return self.undo();
        }
        if key == Key::ctrl(KeyCode::Char('y')) || key == Key::ctrl_shift(KeyCode::Char('z')) {
            return self.redo();
        }
        false
    }

    fn save_session(&mut self, name: &str) -> bool {
        let saved = self.tabs.save_session(&mut self.store, name);
        if saved {
            self.toasts.show(
                format!("Session \"{}\" saved", name.trim()),
                ToastKind::Success,
                ToastOptions::new(),
            );
        } else {
            self.toasts.show(
                format!("Could not save session \"{}\"", name.trim()),
                ToastKind::Error,
                ToastOptions::new(),
            );
        }
        saved
    }

    fn restore_session(&mut self, name: &str) -> bool {
        match self.tabs.find_session(&mut self.store, name) {
            Some(session) => self.tabs.restore_session(&session),
            None => {
                self.toasts.show(
                    format!("No session named \"{}\"", name),
                    ToastKind::Error,
                    ToastOptions::new(),
                );
                false
            }
        }
    }

    fn set_property(&mut self, target: &str, property: &str, value: Value) -> bool {
        let path = format!("{}.{}", target, property);
        let old = self.properties.get(&path).cloned().unwrap_or(Value::Null);
        if old == value {
            return false;
        }
        let at = self.clock.now_ms();
        self.history.record(PropertyChange::new(
            target,
            property,
            old,
            value.clone(),
            at,
        ));
        self.apply_property(target, property, value);
        true
    }

    fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(change) => {
                self.apply_property(&change.target, &change.property, change.old);
                true
            }
            None => false,
        }
    }

    fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(change) => {
                self.apply_property(&change.target, &change.property, change.new);
                true
            }
            None => false,
        }
    }

    /// Stores the value, publishes it and feeds the challenge tracker.
    fn apply_property(&mut self, target: &str, property: &str, value: Value) {
        let path = format!("{}.{}", target, property);
        if value.is_null() {
            self.properties.remove(&path);
        } else {
            self.properties.insert(path.clone(), value.clone());
        }
        self.events_tx.send(LearningEvent::PropertyChanged {
            target: target.to_string(),
            property: property.to_string(),
            value: value.clone(),
        });
        for id in self.challenges.observe(&mut self.store, &path, value) {
            self.events_tx.send(LearningEvent::ChallengeCompleted { id });
        }
    }

    fn auto_save(&mut self) {
        if !self.auto_save || self.tabs.version() == self.saved_version {
            return;
        }
        self.saved_version = self.tabs.version();
        if !self.tabs.persist(&mut self.store) {
            tracing::debug!("tab layout auto-save failed");
        }
    }

    /// Moves bus events into `pending`, turning the ones that need user
    /// feedback into toasts.
    fn pump(&mut self) {
        loop {
            let batch = self.events_rx.drain();
            if batch.is_empty() {
                break;
            }
            for event in &batch {
                self.route(event);
            }
            self.pending.extend(batch);
        }
    }

    fn route(&mut self, event: &PlatformEvent) {
        match event {
            PlatformEvent::Tab(TabEvent::LimitReached { max_tabs }) => {
                self.toasts.show(
                    format!("Maximum of {} tabs reached", max_tabs),
                    ToastKind::Warning,
                    ToastOptions::new(),
                );
            }
            PlatformEvent::Learning(LearningEvent::ChallengeCompleted { id }) => {
                let title = self
                    .challenges
                    .challenges()
                    .iter()
                    .find(|c| &c.id == id)
                    .map(|c| c.title.clone())
                    .unwrap_or_else(|| id.clone());
                self.toasts.show(
                    format!("Challenge completed: {}", title),
                    ToastKind::Success,
                    ToastOptions::new().title("Well done"),
                );
            }
            _ => {}
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/app/mod.rs"]
mod tests;
