use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::kernel::services::ports::BackendKind;
use crate::kernel::toast::{Anchor, ToastKind};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Prefix of every persisted key (`<namespace>:<key>`).
    pub namespace: String,
    pub default_backend: BackendKind,
    /// Upper bound of one serialized entry.
    pub max_entry_bytes: usize,
    /// Directory of the local backend; `None` keeps local data in memory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_dir: Option<PathBuf>,
    pub obfuscation_key: String,
    pub cleanup_interval_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            namespace: "stylelab".to_string(),
            default_backend: BackendKind::Local,
            max_entry_bytes: 1024 * 1024,
            storage_dir: None,
            obfuscation_key: "stylelab".to_string(),
            cleanup_interval_ms: 5 * 60 * 1000,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToastDurations {
    pub success: u64,
    pub error: u64,
    pub warning: u64,
    pub info: u64,
    pub loading: u64,
}

impl Default for ToastDurations {
    fn default() -> Self {
        Self {
            success: 3000,
            error: 6000,
            warning: 5000,
            info: 4000,
            loading: 0,
        }
    }
}

impl ToastDurations {
    pub fn for_kind(&self, kind: ToastKind) -> u64 {
        match kind {
            ToastKind::Success => self.success,
            ToastKind::Error => self.error,
            ToastKind::Warning => self.warning,
            ToastKind::Info => self.info,
            ToastKind::Loading => self.loading,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToastConfig {
    pub max_visible: usize,
    pub queue_limit: usize,
    pub anchor: Anchor,
    pub group_similar: bool,
    pub durations: ToastDurations,
    pub exit_animation_ms: u64,
    pub default_height: u32,
    pub gap: u32,
    pub dismiss_on_click: bool,
}

impl Default for ToastConfig {
    fn default() -> Self {
        Self {
            max_visible: 5,
            queue_limit: 10,
            anchor: Anchor::TopRight,
            group_similar: true,
            durations: ToastDurations::default(),
            exit_animation_ms: 300,
            default_height: 64,
            gap: 8,
            dismiss_on_click: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TabConfig {
    pub max_tabs: usize,
    pub max_sessions: usize,
    pub default_title: String,
    pub default_kind: String,
    /// Persist the layout after every mutation.
    pub auto_save: bool,
}

impl Default for TabConfig {
    fn default() -> Self {
        Self {
            max_tabs: 10,
            max_sessions: 10,
            default_title: "Untitled".to_string(),
            default_kind: "playground".to_string(),
            auto_save: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "action")]
pub enum UndoAction {
    Record,
    Skip,
    /// Merge consecutive changes of one property arriving within the window.
    Coalesce { window_ms: u64 },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoRule {
    /// Regex matched against `<target>.<property>`.
    pub pattern: String,
    #[serde(flatten)]
    pub action: UndoAction,
}

impl UndoRule {
    pub fn new(pattern: impl Into<String>, action: UndoAction) -> Self {
        Self {
            pattern: pattern.into(),
            action,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub max_depth: usize,
    pub rules: Vec<UndoRule>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_depth: 50,
            rules: vec![
                UndoRule::new(r"^ui\.", UndoAction::Skip),
                UndoRule::new(r"\.(hover|focus|preview)$", UndoAction::Skip),
                UndoRule::new(
                    r"\.(opacity|font-size|padding|margin|width|height|border-radius|gap)$",
                    UndoAction::Coalesce { window_ms: 500 },
                ),
            ],
        }
    }
}
