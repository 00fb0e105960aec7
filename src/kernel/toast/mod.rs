//! Bounded toast manager.
//!
//! At most `max_visible` notifications are active; the rest wait in a FIFO
//! overflow queue that evicts its oldest entry when full. Timers are plain
//! deadlines compared against the injected clock on [`NotificationQueue::tick`].

mod layout;
mod notification;

use std::collections::VecDeque;

use crate::core::SharedClock;
use crate::kernel::event::ToastEvent;
use crate::kernel::services::ports::ToastConfig;
use crate::kernel::services::EventSink;

pub use layout::{Anchor, StackDirection, ToastPlacement};
pub use notification::{Notification, ToastHandler, ToastId, ToastKind, ToastOptions, ToastState};

/// A notification that left the active set and is playing its exit animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exiting {
    pub id: ToastId,
    pub finishes_at: u64,
}

pub struct NotificationQueue {
    config: ToastConfig,
    clock: SharedClock,
    events: EventSink,
    active: Vec<Notification>,
    queued: VecDeque<Notification>,
    exiting: Vec<Exiting>,
    /// Window blurred: every timer is held, including ones started meanwhile.
    suspended: bool,
    next_id: u64,
}

impl NotificationQueue {
    /// A `max_visible` of 0 is raised to 1, otherwise nothing would ever show.
    pub fn new(mut config: ToastConfig, clock: SharedClock) -> Self {
        if config.max_visible == 0 {
            tracing::warn!("notifications.max_visible is 0, using 1");
            config.max_visible = 1;
        }
        Self {
            config,
            clock,
            events: EventSink::detached(),
            active: Vec::new(),
            queued: VecDeque::new(),
            exiting: Vec::new(),
            suspended: false,
            next_id: 1,
        }
    }

    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    pub fn config(&self) -> &ToastConfig {
        &self.config
    }

    pub fn set_anchor(&mut self, anchor: Anchor) {
        self.config.anchor = anchor;
    }

    pub fn show(&mut self, message: impl Into<String>, kind: ToastKind, options: ToastOptions) -> ToastId {
        let message = message.into();
        let now = self.clock.now_ms();
        let duration_ms = options
            .duration_ms
            .unwrap_or_else(|| self.config.durations.for_kind(kind));

        if self.config.group_similar {
            let suspended = self.suspended;
            if let Some(existing) = self
                .active
                .iter_mut()
                .find(|n| n.kind == kind && n.message == message)
            {
                existing.message = message;
                if options.title.is_some() {
                    existing.title = options.title;
                }
                if options.handler.is_some() {
                    existing.handler = options.handler;
                }
                existing.duration_ms = duration_ms;
                existing.state = existing.state.restart(duration_ms, now, suspended);
                existing.count = existing.count.saturating_add(1);
                let (id, count) = (existing.id, existing.count);
                tracing::debug!(%id, count, "toast grouped");
                self.events.emit(ToastEvent::Grouped { id, count });
                return id;
            }
        }

        let id = ToastId::new(self.next_id);
        self.next_id += 1;
        let mut notification = Notification {
            id,
            message,
            title: options.title,
            kind,
            duration_ms,
            created_at: now,
            count: 1,
            height: None,
            state: ToastState::Queued,
            handler: options.handler,
        };
        self.events.emit(ToastEvent::Created { id, kind });

        if self.active.len() < self.config.max_visible {
            notification.state = ToastState::start(duration_ms, now, self.suspended);
            self.active.push(notification);
            return id;
        }

        if self.config.queue_limit == 0 {
            tracing::debug!(%id, "toast overflow queue disabled, dropping");
            self.events.emit(ToastEvent::Dropped { id });
            return id;
        }
        while self.queued.len() >= self.config.queue_limit {
            if let Some(evicted) = self.queued.pop_front() {
                tracing::debug!(id = %evicted.id, "toast queue full, evicting oldest");
                self.events.emit(ToastEvent::Dropped { id: evicted.id });
            }
        }
        self.queued.push_back(notification);
        self.events.emit(ToastEvent::Queued { id });
        id
    }

    /// Dismisses an active notification (starting its exit animation and
    /// freeing its slot) or drops a queued one.
    pub fn hide(&mut self, id: ToastId) -> bool {
        if let Some(pos) = self.active.iter().position(|n| n.id == id) {
            self.active.remove(pos);
            let finishes_at = self.clock.now_ms().saturating_add(self.config.exit_animation_ms);
            self.exiting.push(Exiting { id, finishes_at });
            self.events.emit(ToastEvent::Removed { id });
            self.promote();
            return true;
        }
        if let Some(pos) = self.queued.iter().position(|n| n.id == id) {
            self.queued.remove(pos);
            self.events.emit(ToastEvent::Dropped { id });
            return true;
        }
        false
    }

    /// Window lost focus: hold every running timer.
    pub fn pause_all(&mut self) {
        self.suspended = true;
        let now = self.clock.now_ms();
        for notification in &mut self.active {
            notification.state.pause(now);
        }
    }

    /// Window regained focus: restart every held timer with its remaining time.
    pub fn resume_all(&mut self) {
        self.suspended = false;
        let now = self.clock.now_ms();
        for notification in &mut self.active {
            notification.state.resume(now);
        }
    }

    /// Pause-on-hover of a single notification.
    pub fn pause(&mut self, id: ToastId) -> bool {
        let now = self.clock.now_ms();
        self.active_mut(id).is_some_and(|n| n.state.pause(now))
    }

    /// Ignored while every timer is held by [`Self::pause_all`].
    pub fn resume(&mut self, id: ToastId) -> bool {
        if self.suspended {
            return false;
        }
        let now = self.clock.now_ms();
        self.active_mut(id).is_some_and(|n| n.state.resume(now))
    }

    /// Hides matching active notifications and drops matching queued ones.
    /// Returns how many were affected.
    pub fn clear(&mut self, kind: Option<ToastKind>) -> usize {
        let matches = |n: &Notification| kind.map_or(true, |k| n.kind == k);

        let mut affected = 0;
        let events = &self.events;
        self.queued.retain(|n| {
            if matches(n) {
                events.emit(ToastEvent::Dropped { id: n.id });
                affected += 1;
                false
            } else {
                true
            }
        });

        let ids: Vec<ToastId> = self
            .active
            .iter()
            .filter(|n| matches(n))
            .map(|n| n.id)
            .collect();
        for id in ids {
            if self.hide(id) {
                affected += 1;
            }
        }
        affected
    }

    /// Dismisses notifications whose timer ran out and retires finished exit
    /// animations. Returns the ids dismissed by timeout.
    pub fn tick(&mut self) -> Vec<ToastId> {
        let now = self.clock.now_ms();
        let due: Vec<ToastId> = self
            .active
            .iter()
            .filter(|n| n.state.deadline().is_some_and(|d| d <= now))
            .map(|n| n.id)
            .collect();
        for id in &due {
            tracing::trace!(%id, "toast timed out");
            self.hide(*id);
        }
        self.exiting.retain(|e| e.finishes_at > now);
        due
    }

    /// Runs the click handler. A failing handler is logged and the
    /// notification is still dismissed when `dismiss_on_click` is set.
    pub fn click(&mut self, id: ToastId) -> bool {
        let Some(notification) = self.active_mut(id) else {
            return false;
        };
        if let Some(handler) = notification.handler.as_mut() {
            if let Err(error) = handler(id) {
                tracing::warn!(%id, %error, "toast handler failed");
            }
        }
        if self.config.dismiss_on_click {
            self.hide(id);
        }
        true
    }

    /// Records the rendered height used for stacking.
    pub fn set_height(&mut self, id: ToastId, height: u32) -> bool {
        match self.active_mut(id) {
            Some(n) => {
                n.height = Some(height);
                true
            }
            None => false,
        }
    }

    /// Offsets of the active set, ordered by creation time.
    pub fn placements(&self) -> Vec<ToastPlacement> {
        let mut ordered: Vec<&Notification> = self.active.iter().collect();
        ordered.sort_by_key(|n| (n.created_at, n.id));
        layout::stack(
            self.config.anchor,
            self.config.gap,
            ordered
                .into_iter()
                .map(|n| (n.id, n.height.unwrap_or(self.config.default_height))),
        )
    }

    pub fn get(&self, id: ToastId) -> Option<&Notification> {
        self.active
            .iter()
            .chain(self.queued.iter())
            .find(|n| n.id == id)
    }

    pub fn active(&self) -> impl Iterator<Item = &Notification> {
        self.active.iter()
    }

    pub fn queued(&self) -> impl Iterator<Item = &Notification> {
        self.queued.iter()
    }

    pub fn exiting(&self) -> &[Exiting] {
        &self.exiting
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    pub fn queued_len(&self) -> usize {
        self.queued.len()
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    fn active_mut(&mut self, id: ToastId) -> Option<&mut Notification> {
        self.active.iter_mut().find(|n| n.id == id)
    }

    fn promote(&mut self) {
        let now = self.clock.now_ms();
        while self.active.len() < self.config.max_visible {
            let Some(mut next) = self.queued.pop_front() else {
                break;
            };
            next.state = ToastState::start(next.duration_ms, now, self.suspended);
            let id = next.id;
            self.active.push(next);
            tracing::trace!(%id, "toast promoted");
            self.events.emit(ToastEvent::Promoted { id });
        }
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/kernel/toast/mod.rs"]
mod tests;
