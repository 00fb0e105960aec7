use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::{ClearOptions, KeyValueStore, SetOptions, WatchChange, WatchHandle, WatchOptions};
use crate::core::callback::CallbackResult;
use crate::kernel::services::ports::BackendKind;

/// The store's verbs restricted to keys under `<prefix>:`, so independent
/// features cannot collide. Watch callbacks see the prefixed key.
pub struct Scope<'a> {
    store: &'a mut KeyValueStore,
    prefix: String,
}

impl<'a> Scope<'a> {
    pub(super) fn new(store: &'a mut KeyValueStore, prefix: &str) -> Self {
        Self {
            store,
            prefix: format!("{}:", prefix.trim_end_matches(':')),
        }
    }

    pub fn prefix(&self) -> &str {
        self.prefix.trim_end_matches(':')
    }

    fn key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    pub fn set(&mut self, key: &str, value: Value, options: SetOptions) -> bool {
        if key.is_empty() {
            return false;
        }
        let key = self.key(key);
        self.store.set(&key, value, options)
    }

    pub fn set_json<T: Serialize + ?Sized>(&mut self, key: &str, value: &T, options: SetOptions) -> bool {
        if key.is_empty() {
            return false;
        }
        let key = self.key(key);
        self.store.set_json(&key, value, options)
    }

    pub fn get(&mut self, key: &str, backend: Option<BackendKind>) -> Option<Value> {
        let key = self.key(key);
        self.store.get(&key, backend)
    }

    pub fn get_or(&mut self, key: &str, default: Value, backend: Option<BackendKind>) -> Value {
        self.get(key, backend).unwrap_or(default)
    }

    pub fn get_json<T: DeserializeOwned>(&mut self, key: &str, backend: Option<BackendKind>) -> Option<T> {
        let key = self.key(key);
        self.store.get_json(&key, backend)
    }

    pub fn remove(&mut self, key: &str, backend: Option<BackendKind>) -> bool {
        let key = self.key(key);
        self.store.remove(&key, backend)
    }

    pub fn has(&mut self, key: &str, backend: Option<BackendKind>) -> bool {
        let key = self.key(key);
        self.store.has(&key, backend)
    }

    pub fn keys(&mut self, backend: Option<BackendKind>) -> Vec<String> {
        let prefix = self.prefix.clone();
        self.store
            .keys(backend)
            .into_iter()
            .filter_map(|k| k.strip_prefix(prefix.as_str()).map(str::to_string))
            .collect()
    }

    /// Removes only this scope's keys.
    pub fn clear(&mut self, options: ClearOptions) -> bool {
        let kind = self.store.target(options.backend);
        if !self.store.is_available(Some(kind)) {
            return false;
        }
        if options.confirm {
            let prompt = format!("Remove all \"{}\" data?", self.prefix());
            if !self.store.confirm.confirm(&prompt) {
                return false;
            }
        }
        self.store.clear_matching(kind, &self.prefix)
    }

    pub fn watch<F>(&mut self, key: &str, callback: F, options: WatchOptions) -> WatchHandle
    where
        F: FnMut(&WatchChange<'_>) -> CallbackResult + 'static,
    {
        let key = self.key(key);
        self.store.watch(&key, callback, options)
    }

    pub fn unwatch(&mut self, handle: WatchHandle) -> bool {
        self.store.unwatch(handle)
    }

    /// Nested scope: `parent:child:<key>`.
    pub fn scope(&mut self, prefix: &str) -> Scope<'_> {
        let nested = self.key(prefix.trim_end_matches(':'));
        Scope::new(&mut *self.store, &nested)
    }
}
