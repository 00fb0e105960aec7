use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::{Encoding, EntryMeta, KeyValueStore};
use crate::kernel::event::ChangeOrigin;
use crate::kernel::services::ports::BackendKind;

pub const SNAPSHOT_VERSION: u32 = 1;

/// Portable copy of one backend's live entries, values decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub namespace: String,
    pub backend: BackendKind,
    pub exported_at: u64,
    #[serde(default = "snapshot_version")]
    pub version: u32,
    pub entries: BTreeMap<String, SnapshotEntry>,
}

fn snapshot_version() -> u32 {
    SNAPSHOT_VERSION
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub value: Value,
    pub timestamp: u64,
    #[serde(default)]
    pub expires: Option<u64>,
    #[serde(default)]
    pub compressed: bool,
    #[serde(default)]
    pub encrypted: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    pub backend: Option<BackendKind>,
    /// Replace keys that already hold a live value.
    pub overwrite: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
    pub total: usize,
}

impl KeyValueStore {
    pub fn export(&mut self, backend: Option<BackendKind>) -> StoreSnapshot {
        let kind = self.target(backend);
        let mut entries = BTreeMap::new();
        for key in self.keys(Some(kind)) {
            let Ok(Some(stored)) = self.read_entry(kind, &key) else {
                continue;
            };
            let Ok(value) = self.codec.decode(&stored.value, stored.encoding()) else {
                tracing::debug!(key = %key, "export skipped undecodable entry");
                continue;
            };
            entries.insert(
                key,
                SnapshotEntry {
                    value,
                    timestamp: stored.timestamp,
                    expires: stored.expires,
                    compressed: stored.compressed,
                    encrypted: stored.encrypted,
                },
            );
        }

        StoreSnapshot {
            namespace: self.config.namespace.clone(),
            backend: kind,
            exported_at: self.clock.now_ms(),
            version: SNAPSHOT_VERSION,
            entries,
        }
    }

    /// Writes the snapshot's entries, keeping their absolute expiry and
    /// encoding flags. Entries already expired are skipped, as are existing
    /// keys unless `overwrite` is set.
    pub fn import(&mut self, snapshot: &StoreSnapshot, options: ImportOptions) -> ImportReport {
        let kind = self.target(options.backend);
        let now = self.clock.now_ms();
        let mut report = ImportReport {
            total: snapshot.entries.len(),
            ..ImportReport::default()
        };

        for (key, entry) in &snapshot.entries {
            if entry.expires.is_some_and(|at| now >= at) {
                report.skipped += 1;
                continue;
            }
            if !options.overwrite && self.has(key, Some(kind)) {
                report.skipped += 1;
                continue;
            }
            let meta = EntryMeta {
                expires_at: entry.expires,
                encoding: Encoding {
                    compressed: entry.compressed,
                    obfuscated: entry.encrypted,
                },
            };
            match self.write_entry(kind, key, &entry.value, meta, ChangeOrigin::Imported) {
                Ok(()) => report.imported += 1,
                Err(error) => {
                    tracing::warn!(key = %key, %error, "import entry failed");
                    report.skipped += 1;
                }
            }
        }

        tracing::info!(
            backend = %kind,
            imported = report.imported,
            skipped = report.skipped,
            total = report.total,
            "storage import"
        );
        report
    }
}
