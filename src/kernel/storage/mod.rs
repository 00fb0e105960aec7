//! Namespaced key-value persistence over pluggable backends.
//!
//! Every key lives under `<namespace>:<key>` in its backend and is wrapped
//! in a [`StoredEntry`] envelope carrying write time, optional expiry and
//! encoding flags. Expiry is checked lazily: any read that meets an
//! expired entry deletes it and reports the key as absent.
//!
//! Expected failures (unavailable medium, corrupted text, oversized value)
//! never escape as errors: writes return `false`, reads return `None` /
//! the caller's default, and the cause is logged.

mod codec;
pub mod entry;
mod error;
mod scope;
mod snapshot;
mod watch;

use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::core::callback::CallbackResult;
use crate::core::{AutoConfirm, Confirm, SharedClock};
use crate::kernel::event::{ChangeOrigin, StorageEvent};
use crate::kernel::services::adapters::{FileBackend, MemoryBackend, UnavailableBackend};
use crate::kernel::services::ports::{Backend, BackendError, BackendKind, StoreConfig};
use crate::kernel::services::EventSink;

pub use codec::Encoding;
pub use entry::{StorageEntry, StoredEntry};
pub use error::StoreError;
pub use scope::Scope;
pub use snapshot::{ImportOptions, ImportReport, SnapshotEntry, StoreSnapshot};
pub use watch::{WatchCallback, WatchChange, WatchHandle};

use codec::PayloadCodec;
use watch::WatchRegistry;

#[derive(Debug, Clone, Copy, Default)]
pub struct SetOptions {
    pub backend: Option<BackendKind>,
    /// Lifetime of the entry; `None` or `0` never expires.
    pub expires_after_ms: Option<u64>,
    pub compress: bool,
    pub obfuscate: bool,
}

impl SetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn backend(mut self, backend: BackendKind) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn expires_after(mut self, ms: u64) -> Self {
        self.expires_after_ms = Some(ms);
        self
    }

    pub fn compressed(mut self) -> Self {
        self.compress = true;
        self
    }

    pub fn obfuscated(mut self) -> Self {
        self.obfuscate = true;
        self
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ClearOptions {
    pub backend: Option<BackendKind>,
    /// Ask the installed [`Confirm`] capability before removing anything.
    pub confirm: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WatchOptions {
    pub backend: Option<BackendKind>,
    /// Invoke the callback once with the current value before returning.
    pub immediate: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub entries: usize,
    pub bytes: usize,
}

#[derive(Debug, Clone, Copy)]
struct EntryMeta {
    expires_at: Option<u64>,
    encoding: Encoding,
}

pub struct KeyValueStore {
    config: StoreConfig,
    clock: SharedClock,
    backends: FxHashMap<BackendKind, Box<dyn Backend>>,
    codec: PayloadCodec,
    watchers: WatchRegistry,
    confirm: Box<dyn Confirm>,
    events: EventSink,
}

impl KeyValueStore {
    /// Builds the store with its three backends. The local backend is the
    /// configured directory (watched for external writers) or memory when no
    /// directory is set; a directory that cannot be opened degrades to an
    /// unavailable backend.
    pub fn new(config: StoreConfig, clock: SharedClock) -> Self {
        let local: Box<dyn Backend> = match config.storage_dir.as_deref() {
            Some(dir) => match FileBackend::open_watched(dir) {
                Ok(backend) => Box::new(backend),
                Err(error) => {
                    tracing::warn!(dir = %dir.display(), %error, "local storage unavailable");
                    Box::new(UnavailableBackend::new(BackendKind::Local))
                }
            },
            None => Box::new(MemoryBackend::new(BackendKind::Local)),
        };

        let mut store = Self::empty(config, clock);
        store.install_backend(local);
        store.install_backend(Box::new(MemoryBackend::new(BackendKind::Session)));
        store.install_backend(Box::new(MemoryBackend::new(BackendKind::Memory)));
        store
    }

    pub fn in_memory(mut config: StoreConfig, clock: SharedClock) -> Self {
        config.storage_dir = None;
        Self::new(config, clock)
    }

    fn empty(config: StoreConfig, clock: SharedClock) -> Self {
        let codec = PayloadCodec::new(&config.obfuscation_key);
        Self {
            config,
            clock,
            backends: FxHashMap::default(),
            codec,
            watchers: WatchRegistry::default(),
            confirm: Box::new(AutoConfirm::default()),
            events: EventSink::detached(),
        }
    }

    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    pub fn set_confirm(&mut self, confirm: Box<dyn Confirm>) {
        self.confirm = confirm;
    }

    /// Probes `backend` once and installs it for its kind. A backend that
    /// fails the probe is replaced by [`UnavailableBackend`].
    pub fn install_backend(&mut self, mut backend: Box<dyn Backend>) -> bool {
        let kind = backend.kind();
        let available = backend.probe();
        if available {
            self.backends.insert(kind, backend);
        } else {
            tracing::warn!(backend = %kind, "storage backend failed probe, disabling");
            self.backends
                .insert(kind, Box::new(UnavailableBackend::new(kind)));
        }
        available
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn namespace(&self) -> &str {
        &self.config.namespace
    }

    pub fn is_available(&self, backend: Option<BackendKind>) -> bool {
        let kind = self.target(backend);
        self.backends.get(&kind).is_some_and(|b| b.is_available())
    }

    pub fn watcher_count(&self) -> usize {
        self.watchers.len()
    }

    // ---- verbs -------------------------------------------------------

    pub fn set(&mut self, key: &str, value: Value, options: SetOptions) -> bool {
        let kind = self.target(options.backend);
        let now = self.clock.now_ms();
        let meta = EntryMeta {
            expires_at: options
                .expires_after_ms
                .filter(|ms| *ms > 0)
                .map(|ms| now.saturating_add(ms)),
            encoding: Encoding {
                compressed: options.compress,
                obfuscated: options.obfuscate,
            },
        };
        match self.write_entry(kind, key, &value, meta, ChangeOrigin::Local) {
            Ok(()) => true,
            Err(error) => {
                tracing::warn!(backend = %kind, key, %error, "storage set failed");
                false
            }
        }
    }

    pub fn set_json<T: Serialize + ?Sized>(&mut self, key: &str, value: &T, options: SetOptions) -> bool {
        match serde_json::to_value(value) {
            Ok(value) => self.set(key, value, options),
            Err(error) => {
                tracing::warn!(key, %error, "storage set failed: value not serializable");
                false
            }
        }
    }

    pub fn get(&mut self, key: &str, backend: Option<BackendKind>) -> Option<Value> {
        let kind = self.target(backend);
        match self.read_value(kind, key) {
            Ok(value) => value,
            Err(error) => {
                tracing::debug!(backend = %kind, key, %error, "storage get treated as missing");
                None
            }
        }
    }

    pub fn get_or(&mut self, key: &str, default: Value, backend: Option<BackendKind>) -> Value {
        self.get(key, backend).unwrap_or(default)
    }

    /// Typed read; a value of the wrong shape counts as missing.
    pub fn get_json<T: DeserializeOwned>(&mut self, key: &str, backend: Option<BackendKind>) -> Option<T> {
        let value = self.get(key, backend)?;
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(error) => {
                tracing::debug!(key, %error, "stored value has unexpected shape");
                None
            }
        }
    }

    /// Decoded entry with its metadata.
    pub fn entry(&mut self, key: &str, backend: Option<BackendKind>) -> Option<StorageEntry> {
        let kind = self.target(backend);
        let stored = self.read_entry(kind, key).ok().flatten()?;
        let value = self.codec.decode(&stored.value, stored.encoding()).ok()?;
        Some(StorageEntry {
            key: key.to_string(),
            value,
            created_at: stored.timestamp,
            expires_at: stored.expires,
            encoding: stored.encoding(),
        })
    }

    /// Returns whether a live entry existed. Expired or corrupted entries are
    /// deleted as well but report `false`.
    pub fn remove(&mut self, key: &str, backend: Option<BackendKind>) -> bool {
        let kind = self.target(backend);
        if key.is_empty() {
            return false;
        }
        let full = self.full_key(key);
        let now = self.clock.now_ms();
        let removed = match self.backend_mut(kind).and_then(|b| Ok(b.remove_item(&full)?)) {
            Ok(removed) => removed,
            Err(error) => {
                tracing::warn!(backend = %kind, key, %error, "storage remove failed");
                return false;
            }
        };
        let Some(raw) = removed else {
            return false;
        };
        let Ok(entry) = StoredEntry::parse(&raw) else {
            return false;
        };
        let old = self.codec.decode(&entry.value, entry.encoding()).ok();
        if entry.is_expired(now) {
            self.publish(kind, key, None, old.as_ref(), ChangeOrigin::Expired);
            return false;
        }
        self.publish(kind, key, None, old.as_ref(), ChangeOrigin::Removed);
        true
    }

    pub fn has(&mut self, key: &str, backend: Option<BackendKind>) -> bool {
        let kind = self.target(backend);
        if key.is_empty() {
            return false;
        }
        matches!(self.read_entry(kind, key), Ok(Some(_)))
    }

    /// Live keys under the namespace, prefix stripped. Order unspecified.
    pub fn keys(&mut self, backend: Option<BackendKind>) -> Vec<String> {
        let kind = self.target(backend);
        let present = match self.raw_keys(kind) {
            Ok(keys) => keys,
            Err(error) => {
                tracing::warn!(backend = %kind, %error, "storage keys failed");
                return Vec::new();
            }
        };
        present
            .into_iter()
            .filter(|key| matches!(self.read_entry(kind, key), Ok(Some(_))))
            .collect()
    }

    pub fn clear(&mut self, options: ClearOptions) -> bool {
        let kind = self.target(options.backend);
        if !self.is_available(Some(kind)) {
            tracing::warn!(backend = %kind, "storage clear skipped: backend unavailable");
            return false;
        }
        if options.confirm {
            let prompt = format!(
                "Remove all {} data stored under \"{}\"?",
                kind, self.config.namespace
            );
            if !self.confirm.confirm(&prompt) {
                tracing::info!(backend = %kind, "storage clear cancelled");
                return false;
            }
        }
        self.clear_matching(kind, "")
    }

    pub fn watch<F>(&mut self, key: &str, callback: F, options: WatchOptions) -> WatchHandle
    where
        F: FnMut(&WatchChange<'_>) -> CallbackResult + 'static,
    {
        let kind = self.target(options.backend);
        let handle = self.watchers.add(kind, key, Box::new(callback));
        if options.immediate {
            let current = self.get(key, Some(kind));
            self.watchers.notify_one(
                handle,
                &WatchChange {
                    key,
                    new: current.as_ref(),
                    old: None,
                    origin: ChangeOrigin::Initial,
                    backend: kind,
                },
            );
        }
        handle
    }

    pub fn unwatch(&mut self, handle: WatchHandle) -> bool {
        self.watchers.remove(handle)
    }

    /// View restricted to keys under `prefix:`.
    pub fn scope(&mut self, prefix: &str) -> Scope<'_> {
        Scope::new(self, prefix)
    }

    // ---- maintenance -------------------------------------------------

    /// Deletes every expired entry in every backend. Returns how many.
    pub fn sweep(&mut self) -> usize {
        let mut removed = 0;
        for kind in BackendKind::ALL {
            let Ok(keys) = self.raw_keys(kind) else {
                continue;
            };
            for key in keys {
                if self.expire_if_due(kind, &key) {
                    removed += 1;
                }
            }
        }
        if removed > 0 {
            tracing::debug!(removed, "storage sweep");
        }
        removed
    }

    /// Delivers writes made by other processes to watchers. Last write wins.
    pub fn sync_external(&mut self) -> usize {
        let now = self.clock.now_ms();
        let mut delivered = 0;
        for kind in BackendKind::ALL {
            let changes = match self.backends.get_mut(&kind) {
                Some(backend) => backend.poll_external(),
                None => continue,
            };
            for change in changes {
                let Some(key) = self.user_key(&change.key).map(str::to_string) else {
                    continue;
                };
                let new = change.new.as_deref().and_then(|raw| self.decode_raw(raw, now));
                let old = change.old.as_deref().and_then(|raw| self.decode_raw(raw, now));
                tracing::debug!(backend = %kind, key = %key, "external storage change");
                self.publish(kind, &key, new.as_ref(), old.as_ref(), ChangeOrigin::External);
                delivered += 1;
            }
        }
        delivered
    }

    pub fn stats(&self, backend: Option<BackendKind>) -> StoreStats {
        let kind = self.target(backend);
        let Some(b) = self.backends.get(&kind) else {
            return StoreStats::default();
        };
        let prefix = self.prefix();
        let mut stats = StoreStats::default();
        for full in b.keys().unwrap_or_default() {
            if !full.starts_with(&prefix) {
                continue;
            }
            if let Ok(Some(raw)) = b.get_item(&full) {
                stats.entries += 1;
                stats.bytes += full.len() + raw.len();
            }
        }
        stats
    }

    // ---- internals ---------------------------------------------------

    fn target(&self, backend: Option<BackendKind>) -> BackendKind {
        backend.unwrap_or(self.config.default_backend)
    }

    fn prefix(&self) -> String {
        format!("{}:", self.config.namespace)
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}:{}", self.config.namespace, key)
    }

    fn user_key<'k>(&self, full: &'k str) -> Option<&'k str> {
        full.strip_prefix(self.config.namespace.as_str())?
            .strip_prefix(':')
    }

    fn backend_mut(&mut self, kind: BackendKind) -> Result<&mut dyn Backend, StoreError> {
        match self.backends.get_mut(&kind) {
            Some(backend) => Ok(backend.as_mut()),
            None => Err(BackendError::Unavailable(kind).into()),
        }
    }

    /// Namespaced keys physically present, prefix stripped.
    fn raw_keys(&self, kind: BackendKind) -> Result<Vec<String>, StoreError> {
        let backend = self
            .backends
            .get(&kind)
            .ok_or(BackendError::Unavailable(kind))?;
        Ok(backend
            .keys()?
            .iter()
            .filter_map(|full| self.user_key(full).map(str::to_string))
            .collect())
    }

    /// Loads the envelope of `key`, deleting it when expired.
    fn read_entry(&mut self, kind: BackendKind, key: &str) -> Result<Option<StoredEntry>, StoreError> {
        let full = self.full_key(key);
        let raw = match self.backends.get(&kind) {
            Some(backend) => backend.get_item(&full)?,
            None => return Ok(None),
        };
        let Some(raw) = raw else {
            return Ok(None);
        };
        let entry = StoredEntry::parse(&raw)?;
        if entry.is_expired(self.clock.now_ms()) {
            self.expire(kind, key, &entry);
            return Ok(None);
        }
        Ok(Some(entry))
    }

    fn read_value(&mut self, kind: BackendKind, key: &str) -> Result<Option<Value>, StoreError> {
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }
        let Some(entry) = self.read_entry(kind, key)? else {
            return Ok(None);
        };
        Ok(Some(self.codec.decode(&entry.value, entry.encoding())?))
    }

    fn expire_if_due(&mut self, kind: BackendKind, key: &str) -> bool {
        let full = self.full_key(key);
        let raw = match self.backends.get(&kind).map(|b| b.get_item(&full)) {
            Some(Ok(Some(raw))) => raw,
            _ => return false,
        };
        match StoredEntry::parse(&raw) {
            Ok(entry) if entry.is_expired(self.clock.now_ms()) => {
                self.expire(kind, key, &entry);
                true
            }
            _ => false,
        }
    }

    fn expire(&mut self, kind: BackendKind, key: &str, entry: &StoredEntry) {
        let full = self.full_key(key);
        if let Err(error) = self.backend_mut(kind).and_then(|b| Ok(b.remove_item(&full)?)) {
            tracing::warn!(backend = %kind, key, %error, "remove expired entry failed");
        }
        let old = self.codec.decode(&entry.value, entry.encoding()).ok();
        self.publish(kind, key, None, old.as_ref(), ChangeOrigin::Expired);
    }

    fn decode_raw(&self, raw: &str, now: u64) -> Option<Value> {
        let entry = StoredEntry::parse(raw).ok()?;
        if entry.is_expired(now) {
            return None;
        }
        self.codec.decode(&entry.value, entry.encoding()).ok()
    }

    fn write_entry(
        &mut self,
        kind: BackendKind,
        key: &str,
        value: &Value,
        meta: EntryMeta,
        origin: ChangeOrigin,
    ) -> Result<(), StoreError> {
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }
        if !self.is_available(Some(kind)) {
            return Err(BackendError::Unavailable(kind).into());
        }

        let old = if self.watchers.is_watched(kind, key) {
            self.read_value(kind, key).ok().flatten()
        } else {
            None
        };

        let entry = StoredEntry {
            value: self.codec.encode(value, meta.encoding)?,
            timestamp: self.clock.now_ms(),
            version: entry::ENTRY_VERSION,
            expires: meta.expires_at,
            compressed: meta.encoding.compressed,
            encrypted: meta.encoding.obfuscated,
        };
        let text = entry.to_text()?;
        if text.len() > self.config.max_entry_bytes {
            return Err(StoreError::TooLarge {
                size: text.len(),
                limit: self.config.max_entry_bytes,
            });
        }

        let full = self.full_key(key);
        self.backend_mut(kind)?.set_item(&full, text)?;
        self.publish(kind, key, Some(value), old.as_ref(), origin);
        Ok(())
    }

    /// Removes every key starting with `scope_prefix` (all keys for "").
    fn clear_matching(&mut self, kind: BackendKind, scope_prefix: &str) -> bool {
        let keys = match self.raw_keys(kind) {
            Ok(keys) => keys,
            Err(error) => {
                tracing::warn!(backend = %kind, %error, "storage clear failed");
                return false;
            }
        };

        let now = self.clock.now_ms();
        let mut ok = true;
        let mut cleared = 0usize;
        for key in keys.into_iter().filter(|k| k.starts_with(scope_prefix)) {
            let full = self.full_key(&key);
            match self.backend_mut(kind).and_then(|b| Ok(b.remove_item(&full)?)) {
                Ok(Some(raw)) => {
                    let old = self.decode_raw(&raw, now);
                    self.publish(kind, &key, None, old.as_ref(), ChangeOrigin::Cleared);
                    cleared += 1;
                }
                Ok(None) => {}
                Err(error) => {
                    tracing::warn!(backend = %kind, key = %key, %error, "storage clear item failed");
                    ok = false;
                }
            }
        }
        tracing::info!(backend = %kind, cleared, "storage cleared");
        ok
    }

    fn publish(
        &mut self,
        kind: BackendKind,
        key: &str,
        new: Option<&Value>,
        old: Option<&Value>,
        origin: ChangeOrigin,
    ) {
        self.watchers.notify(&WatchChange {
            key,
            new,
            old,
            origin,
            backend: kind,
        });
        self.events.emit(StorageEvent::Changed {
            backend: kind,
            key: key.to_string(),
            origin,
        });
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/kernel/storage/mod.rs"]
mod tests;
