use rustc_hash::FxHashMap;

use crate::kernel::services::ports::{Backend, BackendError, BackendKind};

/// Process-lifetime medium. Backs `Session`, `Memory` and a local backend
/// that has no directory configured.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    kind: BackendKind,
    items: FxHashMap<String, String>,
    /// Total byte budget of keys + values; `None` is unbounded.
    quota: Option<usize>,
}

impl MemoryBackend {
    pub fn new(kind: BackendKind) -> Self {
        Self {
            kind,
            items: FxHashMap::default(),
            quota: None,
        }
    }

    pub fn with_quota(kind: BackendKind, quota: usize) -> Self {
        Self {
            quota: Some(quota),
            ..Self::new(kind)
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn used_bytes(&self) -> usize {
        self.items.iter().map(|(k, v)| k.len() + v.len()).sum()
    }
}

impl Backend for MemoryBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn get_item(&self, key: &str) -> Result<Option<String>, BackendError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: String) -> Result<(), BackendError> {
        if let Some(limit) = self.quota {
            let replaced = self.items.get(key).map(|v| key.len() + v.len()).unwrap_or(0);
            let needed = self.used_bytes() - replaced + key.len() + value.len();
            if needed > limit {
                return Err(BackendError::QuotaExceeded { needed, limit });
            }
        }
        self.items.insert(key.to_string(), value);
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<Option<String>, BackendError> {
        Ok(self.items.remove(key))
    }

    fn keys(&self) -> Result<Vec<String>, BackendError> {
        Ok(self.items.keys().cloned().collect())
    }
}
