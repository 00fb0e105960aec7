use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::codec::Encoding;
use super::error::StoreError;

pub const ENTRY_VERSION: u32 = 1;

/// Persisted envelope: `{ value, timestamp, version, expires, compressed, encrypted }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEntry {
    pub value: Value,
    pub timestamp: u64,
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub expires: Option<u64>,
    #[serde(default)]
    pub compressed: bool,
    #[serde(default)]
    pub encrypted: bool,
}

fn default_version() -> u32 {
    ENTRY_VERSION
}

impl StoredEntry {
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        serde_json::from_str(raw).map_err(|e| StoreError::Corrupted(e.to_string()))
    }

    pub fn to_text(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.expires.is_some_and(|at| now_ms >= at)
    }

    pub fn encoding(&self) -> Encoding {
        Encoding {
            compressed: self.compressed,
            obfuscated: self.encrypted,
        }
    }
}

/// Decoded view of one entry handed to callers.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageEntry {
    pub key: String,
    pub value: Value,
    pub created_at: u64,
    pub expires_at: Option<u64>,
    pub encoding: Encoding,
}
