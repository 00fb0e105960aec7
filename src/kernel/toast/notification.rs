use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::callback::CallbackResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ToastId(u64);

impl ToastId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ToastId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "toast-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
    Warning,
    Info,
    Loading,
}

impl ToastKind {
    pub const ALL: [ToastKind; 5] = [
        ToastKind::Success,
        ToastKind::Error,
        ToastKind::Warning,
        ToastKind::Info,
        ToastKind::Loading,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ToastKind::Success => "success",
            ToastKind::Error => "error",
            ToastKind::Warning => "warning",
            ToastKind::Info => "info",
            ToastKind::Loading => "loading",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }
}

impl fmt::Display for ToastKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of one notification. Exactly one state holds at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastState {
    /// Waiting in the overflow queue; no timer.
    Queued,
    /// Active without auto-dismiss.
    Persistent,
    Running { started_at: u64, remaining: u64 },
    Paused { remaining: u64 },
}

impl ToastState {
    /// Timer for a notification becoming active at `now`.
    pub(super) fn start(duration_ms: u64, now: u64, suspended: bool) -> Self {
        match duration_ms {
            0 => ToastState::Persistent,
            remaining if suspended => ToastState::Paused { remaining },
            remaining => ToastState::Running {
                started_at: now,
                remaining,
            },
        }
    }

    /// Timer reset of a grouped repeat. A paused timer stays paused with the
    /// full new duration; the pointer may still be on it.
    pub(super) fn restart(self, duration_ms: u64, now: u64, suspended: bool) -> Self {
        match self {
            ToastState::Paused { .. } if duration_ms > 0 => ToastState::Paused {
                remaining: duration_ms,
            },
            _ => ToastState::start(duration_ms, now, suspended),
        }
    }

    pub fn deadline(&self) -> Option<u64> {
        match *self {
            ToastState::Running {
                started_at,
                remaining,
            } => Some(started_at.saturating_add(remaining)),
            _ => None,
        }
    }

    pub fn remaining(&self, now: u64) -> Option<u64> {
        match *self {
            ToastState::Running { .. } => self.deadline().map(|d| d.saturating_sub(now)),
            ToastState::Paused { remaining } => Some(remaining),
            _ => None,
        }
    }

    pub(super) fn pause(&mut self, now: u64) -> bool {
        match self.remaining(now) {
            Some(remaining) if matches!(self, ToastState::Running { .. }) => {
                *self = ToastState::Paused { remaining };
                true
            }
            _ => false,
        }
    }

    pub(super) fn resume(&mut self, now: u64) -> bool {
        match *self {
            ToastState::Paused { remaining } => {
                *self = ToastState::Running {
                    started_at: now,
                    remaining,
                };
                true
            }
            _ => false,
        }
    }
}

/// Click/action handler attached to a notification.
pub type ToastHandler = Box<dyn FnMut(ToastId) -> CallbackResult>;

#[derive(Default)]
pub struct ToastOptions {
    /// Overrides the per-kind default; `Some(0)` is persistent.
    pub duration_ms: Option<u64>,
    pub title: Option<String>,
    pub handler: Option<ToastHandler>,
}

impl ToastOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn duration(mut self, ms: u64) -> Self {
        self.duration_ms = Some(ms);
        self
    }

    pub fn persistent(self) -> Self {
        self.duration(0)
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn on_click<F>(mut self, handler: F) -> Self
    where
        F: FnMut(ToastId) -> CallbackResult + 'static,
    {
        self.handler = Some(Box::new(handler));
        self
    }
}

pub struct Notification {
    pub(super) id: ToastId,
    pub(super) message: String,
    pub(super) title: Option<String>,
    pub(super) kind: ToastKind,
    pub(super) duration_ms: u64,
    pub(super) created_at: u64,
    pub(super) count: u32,
    pub(super) height: Option<u32>,
    pub(super) state: ToastState,
    pub(super) handler: Option<ToastHandler>,
}

impl Notification {
    pub fn id(&self) -> ToastId {
        self.id
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn kind(&self) -> ToastKind {
        self.kind
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    /// How many `show` calls were grouped into this notification.
    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn state(&self) -> ToastState {
        self.state
    }

    pub fn is_paused(&self) -> bool {
        matches!(self.state, ToastState::Paused { .. })
    }
}

impl fmt::Debug for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notification")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("message", &self.message)
            .field("count", &self.count)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
