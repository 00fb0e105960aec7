//! Serialized tab layouts.
//!
//! Named sessions live under `tabs:sessions` as one list; the auto-saved
//! layout lives under `tabs:current`.

use serde::{Deserialize, Serialize};

use super::tab::{Tab, TabId};
use crate::kernel::storage::{KeyValueStore, SetOptions};

pub(super) const SCOPE: &str = "tabs";
pub(super) const SESSIONS_KEY: &str = "sessions";
pub(super) const CURRENT_KEY: &str = "current";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabSnapshot {
    pub id: TabId,
    pub title: String,
    pub kind: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub modified: bool,
}

impl From<&Tab> for TabSnapshot {
    fn from(tab: &Tab) -> Self {
        Self {
            id: tab.id,
            title: tab.title.clone(),
            kind: tab.kind.clone(),
            content: tab.content.clone(),
            modified: tab.modified,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabSession {
    pub name: String,
    pub tabs: Vec<TabSnapshot>,
    #[serde(default)]
    pub active_tab: Option<TabId>,
    #[serde(default)]
    pub timestamp: u64,
}

pub(super) fn load_sessions(store: &mut KeyValueStore) -> Vec<TabSession> {
    store
        .scope(SCOPE)
        .get_json::<Vec<TabSession>>(SESSIONS_KEY, None)
        .unwrap_or_default()
}

pub(super) fn store_sessions(store: &mut KeyValueStore, sessions: &[TabSession]) -> bool {
    store
        .scope(SCOPE)
        .set_json(SESSIONS_KEY, sessions, SetOptions::new())
}

pub(super) fn load_current(store: &mut KeyValueStore) -> Option<TabSession> {
    store.scope(SCOPE).get_json(CURRENT_KEY, None)
}

pub(super) fn store_current(store: &mut KeyValueStore, session: &TabSession) -> bool {
    store
        .scope(SCOPE)
        .set_json(CURRENT_KEY, session, SetOptions::new())
}
