//! Directory-backed local medium.
//!
//! One file per item, named after the hex encoding of the key. Writes go
//! through a temp file + rename so other processes never observe a torn
//! value. A notify watcher records which items other writers touched;
//! [`Backend::poll_external`] turns those into [`ExternalChange`]s by diffing
//! the disk against the in-memory view.

use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use crate::kernel::services::ports::{Backend, BackendError, BackendKind, ExternalChange};

const ITEM_EXT: &str = "json";
const TMP_EXT: &str = "tmp";
const WATCHER_POLL_INTERVAL: Duration = Duration::from_millis(250);
const MAX_FILE_NAME: usize = 255;
/// Longest key whose hex file name plus extension fits in one path component.
pub const MAX_KEY_BYTES: usize = (MAX_FILE_NAME - ITEM_EXT.len() - 1) / 2;

pub struct FileBackend {
    dir: PathBuf,
    items: FxHashMap<String, String>,
    watcher: Option<RecommendedWatcher>,
    raw_event_rx: Option<mpsc::Receiver<notify::Event>>,
}

impl std::fmt::Debug for FileBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileBackend")
            .field("dir", &self.dir)
            .field("items", &self.items.len())
            .field("watching", &self.watcher.is_some())
            .finish()
    }
}

impl FileBackend {
    /// Opens (creating if needed) `dir` and loads every item into memory.
    pub fn open(dir: &Path) -> Result<Self, BackendError> {
        std::fs::create_dir_all(dir)?;
        let dir = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());

        let mut items = FxHashMap::default();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            let Some(key) = key_from_path(&path) else {
                continue;
            };
            match std::fs::read_to_string(&path) {
                Ok(content) => {
                    items.insert(key, content);
                }
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "skip unreadable item");
                }
            }
        }

        Ok(Self {
            dir,
            items,
            watcher: None,
            raw_event_rx: None,
        })
    }

    /// Like [`FileBackend::open`], also watching the directory for writes
    /// made by other processes. A watcher that cannot start is logged and
    /// the backend keeps working without external change detection.
    pub fn open_watched(dir: &Path) -> Result<Self, BackendError> {
        let mut backend = Self::open(dir)?;
        let (tx, rx) = mpsc::channel();
        let watcher = RecommendedWatcher::new(
            move |res: Result<notify::Event, notify::Error>| {
                let Ok(event) = res else { return };
                let _ = tx.send(event);
            },
            Config::default().with_poll_interval(WATCHER_POLL_INTERVAL),
        )
        .and_then(|mut watcher| {
            watcher.watch(&backend.dir, RecursiveMode::NonRecursive)?;
            Ok(watcher)
        });

        match watcher {
            Ok(watcher) => {
                backend.watcher = Some(watcher);
                backend.raw_event_rx = Some(rx);
            }
            Err(error) => {
                tracing::warn!(dir = %backend.dir.display(), %error, "store watcher unavailable");
            }
        }
        Ok(backend)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn is_watching(&self) -> bool {
        self.watcher.is_some()
    }

    fn item_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", encode_key(key), ITEM_EXT))
    }

    fn read_disk(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.item_path(key)).ok()
    }

    /// Keys whose files were touched since the last drain.
    fn drain_touched(&mut self) -> FxHashSet<String> {
        let mut touched = FxHashSet::default();
        let Some(rx) = self.raw_event_rx.as_ref() else {
            return touched;
        };
        while let Ok(event) = rx.try_recv() {
            if !matches!(
                event.kind,
                EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
            ) {
                continue;
            }
            for path in &event.paths {
                if let Some(key) = key_from_path(path) {
                    touched.insert(key);
                }
            }
        }
        touched
    }
}

impl Backend for FileBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    fn get_item(&self, key: &str) -> Result<Option<String>, BackendError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: String) -> Result<(), BackendError> {
        check_key_len(key)?;
        let path = self.item_path(key);
        let tmp = path.with_extension(TMP_EXT);
        std::fs::write(&tmp, value.as_bytes())?;
        if let Err(e) = std::fs::rename(&tmp, &path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        self.items.insert(key.to_string(), value);
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<Option<String>, BackendError> {
        if key.len() > MAX_KEY_BYTES {
            return Ok(None);
        }
        let path = self.item_path(key);
        match std::fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        Ok(self.items.remove(key))
    }

    fn keys(&self) -> Result<Vec<String>, BackendError> {
        Ok(self.items.keys().cloned().collect())
    }

    fn poll_external(&mut self) -> Vec<ExternalChange> {
        let mut touched = self.drain_touched().into_iter().collect::<Vec<_>>();
        touched.sort_unstable();

        let mut changes = Vec::new();
        for key in touched {
            let new = self.read_disk(&key);
            let old = self.items.get(&key).cloned();
            // Our own writes already updated `items`, so they diff as equal.
            if new == old {
                continue;
            }
            match &new {
                Some(value) => {
                    self.items.insert(key.clone(), value.clone());
                }
                None => {
                    self.items.remove(&key);
                }
            }
            changes.push(ExternalChange { key, old, new });
        }
        changes
    }
}

fn check_key_len(key: &str) -> Result<(), BackendError> {
    if key.len() > MAX_KEY_BYTES {
        return Err(BackendError::KeyTooLong {
            len: key.len(),
            limit: MAX_KEY_BYTES,
        });
    }
    Ok(())
}

fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len() * 2);
    for byte in key.as_bytes() {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}

fn decode_key(name: &str) -> Option<String> {
    if name.len() % 2 != 0 {
        return None;
    }
    let bytes = (0..name.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(name.get(i..i + 2)?, 16).ok())
        .collect::<Option<Vec<u8>>>()?;
    String::from_utf8(bytes).ok()
}

fn key_from_path(path: &Path) -> Option<String> {
    if path.extension().and_then(|e| e.to_str()) != Some(ITEM_EXT) {
        return None;
    }
    decode_key(path.file_stem()?.to_str()?)
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/adapters/file.rs"]
mod tests;
