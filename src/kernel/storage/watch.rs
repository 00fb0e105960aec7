use serde_json::Value;
use slotmap::SlotMap;

use crate::core::callback::CallbackResult;
use crate::kernel::event::ChangeOrigin;
use crate::kernel::services::ports::BackendKind;

slotmap::new_key_type! {
    /// Returned by `watch`; pass to `unwatch` to unsubscribe.
    pub struct WatchHandle;
}

/// Arguments of a watcher invocation: `(new, old, key)` plus context.
#[derive(Debug, Clone, Copy)]
pub struct WatchChange<'a> {
    pub key: &'a str,
    pub new: Option<&'a Value>,
    pub old: Option<&'a Value>,
    pub origin: ChangeOrigin,
    pub backend: BackendKind,
}

pub type WatchCallback = Box<dyn FnMut(&WatchChange<'_>) -> CallbackResult>;

struct Watcher {
    backend: BackendKind,
    key: String,
    callback: WatchCallback,
}

#[derive(Default)]
pub(super) struct WatchRegistry {
    watchers: SlotMap<WatchHandle, Watcher>,
}

impl WatchRegistry {
    pub fn add(&mut self, backend: BackendKind, key: &str, callback: WatchCallback) -> WatchHandle {
        self.watchers.insert(Watcher {
            backend,
            key: key.to_string(),
            callback,
        })
    }

    pub fn remove(&mut self, handle: WatchHandle) -> bool {
        self.watchers.remove(handle).is_some()
    }

    pub fn is_watched(&self, backend: BackendKind, key: &str) -> bool {
        self.watchers
            .values()
            .any(|w| w.backend == backend && w.key == key)
    }

    pub fn len(&self) -> usize {
        self.watchers.len()
    }

    /// Invokes every matching watcher. A watcher that fails is logged and
    /// unregistered; the others still run.
    pub fn notify(&mut self, change: &WatchChange<'_>) {
        let mut failed = Vec::new();
        for (handle, watcher) in self.watchers.iter_mut() {
            if watcher.backend != change.backend || watcher.key != change.key {
                continue;
            }
            if let Err(error) = (watcher.callback)(change) {
                tracing::warn!(key = change.key, %error, "storage watcher failed, unregistering");
                failed.push(handle);
            }
        }
        for handle in failed {
            self.watchers.remove(handle);
        }
    }

    /// Invokes a single watcher (the `immediate` call of `watch`).
    pub fn notify_one(&mut self, handle: WatchHandle, change: &WatchChange<'_>) {
        let Some(watcher) = self.watchers.get_mut(handle) else {
            return;
        };
        if let Err(error) = (watcher.callback)(change) {
            tracing::warn!(key = change.key, %error, "storage watcher failed, unregistering");
            self.watchers.remove(handle);
        }
    }
}
