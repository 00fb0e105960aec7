use serde::{Deserialize, Serialize};

use super::config::{HistoryConfig, StoreConfig, TabConfig, ToastConfig};
use crate::kernel::learning::Challenge;

/// On-disk settings file. Every section falls back to its defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub storage: StoreConfig,
    #[serde(default)]
    pub notifications: ToastConfig,
    #[serde(default)]
    pub tabs: TabConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub keybindings: Vec<KeybindingRule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub challenges: Vec<Challenge>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeybindingRule {
    pub key: String,
    pub command: String,
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/ports/settings.rs"]
mod tests;
