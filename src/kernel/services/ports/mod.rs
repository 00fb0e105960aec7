//! Service ports: traits + data contracts.

pub mod backend;
pub mod config;
pub mod settings;

pub use backend::{Backend, BackendError, BackendKind, ExternalChange};
pub use config::{
    HistoryConfig, StoreConfig, TabConfig, ToastConfig, ToastDurations, UndoAction, UndoRule,
};
pub use settings::{KeybindingRule, Settings};
