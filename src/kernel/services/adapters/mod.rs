//! Service adapters: filesystem / platform specific implementations.

pub mod file;
pub mod memory;
pub mod paths;
pub mod settings;
pub mod unavailable;

pub use file::FileBackend;
pub use memory::MemoryBackend;
pub use paths::{ensure_log_dir, ensure_store_dir, get_log_dir, get_store_dir, resolve_store_dir};
pub use settings::{
    ensure_settings_file, ensure_settings_file_at, get_settings_path, load_settings,
    read_settings, SettingsError,
};
pub use unavailable::UnavailableBackend;
