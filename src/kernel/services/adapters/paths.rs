//! Platform data directories.
//!
//! - macOS: ~/Library/Application Support/stylelab/{store,logs}
//! - Linux: $XDG_DATA_HOME/stylelab or ~/.local/share/stylelab
//! - Windows: %APPDATA%\stylelab

use std::path::{Path, PathBuf};

const APP_NAME: &str = "stylelab";
const STORE_DIR: &str = "store";
const LOG_DIR: &str = "logs";

fn get_app_data_dir() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        std::env::var("HOME").ok().map(|home| {
            PathBuf::from(home)
                .join("Library/Application Support")
                .join(APP_NAME)
        })
    }

    #[cfg(target_os = "linux")]
    {
        if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
            Some(PathBuf::from(xdg).join(APP_NAME))
        } else {
            std::env::var("HOME")
                .ok()
                .map(|home| PathBuf::from(home).join(".local/share").join(APP_NAME))
        }
    }

    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA")
            .ok()
            .map(|appdata| PathBuf::from(appdata).join(APP_NAME))
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        None
    }
}

/// Default directory of the local storage backend.
pub fn get_store_dir() -> Option<PathBuf> {
    get_app_data_dir().map(|p| p.join(STORE_DIR))
}

pub fn get_log_dir() -> Option<PathBuf> {
    get_app_data_dir().map(|p| p.join(LOG_DIR))
}

fn ensure_dir(dir: Option<PathBuf>, what: &str) -> std::io::Result<PathBuf> {
    let dir = dir.ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Cannot determine {} directory", what),
        )
    })?;

    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
    }

    Ok(dir)
}

pub fn ensure_store_dir() -> std::io::Result<PathBuf> {
    ensure_dir(get_store_dir(), "store")
}

pub fn ensure_log_dir() -> std::io::Result<PathBuf> {
    ensure_dir(get_log_dir(), "log")
}

/// Store directory to use: explicit override first, platform default next.
pub fn resolve_store_dir(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => get_store_dir(),
    }
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/adapters/paths.rs"]
mod tests;
