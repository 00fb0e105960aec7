use serde::{Deserialize, Serialize};
use std::fmt;

/// Which storage medium an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Survives restarts (file directory, or memory when none is configured).
    #[default]
    Local,
    /// Lives as long as the process.
    Session,
    Memory,
}

impl BackendKind {
    pub const ALL: [BackendKind; 3] = [BackendKind::Local, BackendKind::Session, BackendKind::Memory];

    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::Local => "local",
            BackendKind::Session => "session",
            BackendKind::Memory => "memory",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "local" | "localstorage" => Some(BackendKind::Local),
            "session" | "sessionstorage" => Some(BackendKind::Session),
            "memory" | "mem" => Some(BackendKind::Memory),
            _ => None,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub enum BackendError {
    Unavailable(BackendKind),
    Io(std::io::Error),
    QuotaExceeded { needed: usize, limit: usize },
    /// The medium cannot address a key this long.
    KeyTooLong { len: usize, limit: usize },
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::Unavailable(kind) => write!(f, "{} storage is unavailable", kind),
            BackendError::Io(e) => write!(f, "storage io error: {}", e),
            BackendError::QuotaExceeded { needed, limit } => {
                write!(f, "storage quota exceeded ({} > {} bytes)", needed, limit)
            }
            BackendError::KeyTooLong { len, limit } => {
                write!(f, "storage key too long ({} > {} bytes)", len, limit)
            }
        }
    }
}

impl std::error::Error for BackendError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BackendError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for BackendError {
    fn from(e: std::io::Error) -> Self {
        BackendError::Io(e)
    }
}

/// A raw item changed underneath us by another writer of the same medium.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalChange {
    pub key: String,
    pub old: Option<String>,
    pub new: Option<String>,
}

const PROBE_KEY: &str = "__stylelab_probe__";

/// Raw string key-value medium, the shape of `localStorage`.
pub trait Backend {
    fn kind(&self) -> BackendKind;

    fn is_available(&self) -> bool {
        true
    }

    fn get_item(&self, key: &str) -> Result<Option<String>, BackendError>;

    fn set_item(&mut self, key: &str, value: String) -> Result<(), BackendError>;

    /// Removes the item, returning the previous raw value.
    fn remove_item(&mut self, key: &str) -> Result<Option<String>, BackendError>;

    fn keys(&self) -> Result<Vec<String>, BackendError>;

    /// Drains changes made by other writers since the last call.
    fn poll_external(&mut self) -> Vec<ExternalChange> {
        Vec::new()
    }

    /// Write-then-remove round trip used once when the backend is installed.
    fn probe(&mut self) -> bool {
        if !self.is_available() {
            return false;
        }
        let written = self.set_item(PROBE_KEY, "1".to_string()).is_ok();
        let read_back = matches!(self.get_item(PROBE_KEY), Ok(Some(ref v)) if v == "1");
        let removed = self.remove_item(PROBE_KEY).is_ok();
        written && read_back && removed
    }
}
