use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use crate::kernel::event::PlatformEvent;

#[derive(Clone)]
pub struct EventBusSender {
    tx: Sender<PlatformEvent>,
}

pub struct EventBusReceiver {
    rx: Receiver<PlatformEvent>,
}

pub fn event_bus() -> (EventBusSender, EventBusReceiver) {
    let (tx, rx) = mpsc::channel();
    (EventBusSender { tx }, EventBusReceiver { rx })
}

impl EventBusSender {
    pub fn send(&self, event: impl Into<PlatformEvent>) {
        let event = event.into();
        let name = event.name();
        if self.tx.send(event).is_err() {
            tracing::trace!(event = name, "event bus closed, dropping event");
        }
    }
}

impl EventBusReceiver {
    pub fn try_recv(&mut self) -> Result<PlatformEvent, TryRecvError> {
        self.rx.try_recv()
    }

    pub fn drain(&mut self) -> Vec<PlatformEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}

/// Optional sender held by components that may run without a bus.
#[derive(Clone, Default)]
pub struct EventSink {
    tx: Option<EventBusSender>,
}

impl EventSink {
    pub fn new(tx: EventBusSender) -> Self {
        Self { tx: Some(tx) }
    }

    pub fn detached() -> Self {
        Self { tx: None }
    }

    pub fn emit(&self, event: impl Into<PlatformEvent>) {
        if let Some(tx) = &self.tx {
            tx.send(event);
        }
    }
}
