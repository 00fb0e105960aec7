use crate::kernel::services::ports::settings::Settings;
use std::fmt;
use std::path::{Path, PathBuf};

const SETTINGS_DIR: &str = ".stylelab";
const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug)]
pub enum SettingsError {
    NoSettingsDir,
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::NoSettingsDir => write!(f, "Cannot determine settings directory"),
            SettingsError::Io(e) => write!(f, "settings io error: {}", e),
            SettingsError::Parse(e) => write!(f, "invalid settings file: {}", e),
        }
    }
}

impl std::error::Error for SettingsError {}

impl From<std::io::Error> for SettingsError {
    fn from(e: std::io::Error) -> Self {
        SettingsError::Io(e)
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(e: serde_json::Error) -> Self {
        SettingsError::Parse(e)
    }
}

pub fn get_settings_path() -> Option<PathBuf> {
    get_cache_dir().map(|dir| dir.join(SETTINGS_DIR).join(SETTINGS_FILE))
}

/// Creates the settings file with defaults when it does not exist yet.
pub fn ensure_settings_file() -> Result<PathBuf, SettingsError> {
    let path = get_settings_path().ok_or(SettingsError::NoSettingsDir)?;
    ensure_settings_file_at(&path)?;
    Ok(path)
}

pub fn ensure_settings_file_at(path: &Path) -> Result<(), SettingsError> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    if !path.exists() {
        let content = serde_json::to_string_pretty(&Settings::default())?;
        std::fs::write(path, content)?;
    }
    Ok(())
}

pub fn read_settings(path: &Path) -> Result<Settings, SettingsError> {
    let data = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

/// Loads the user settings, falling back to defaults on any failure.
pub fn load_settings() -> Settings {
    let Some(path) = get_settings_path() else {
        return Settings::default();
    };
    if !path.exists() {
        return Settings::default();
    }
    match read_settings(&path) {
        Ok(settings) => settings,
        Err(error) => {
            tracing::warn!(path = %path.display(), %error, "load settings failed, using defaults");
            Settings::default()
        }
    }
}

fn get_cache_dir() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        return std::env::var("HOME")
            .ok()
            .map(|home| PathBuf::from(home).join("Library/Caches"));
    }

    #[cfg(target_os = "linux")]
    {
        if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
            return Some(PathBuf::from(xdg));
        }
        return std::env::var("HOME")
            .ok()
            .map(|home| PathBuf::from(home).join(".cache"));
    }

    #[cfg(target_os = "windows")]
    {
        if let Ok(local) = std::env::var("LOCALAPPDATA") {
            return Some(PathBuf::from(local));
        }
        return std::env::var("APPDATA").ok().map(PathBuf::from);
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        None
    }
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/adapters/settings.rs"]
mod tests;
