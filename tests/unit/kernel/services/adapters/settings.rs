use super::*;
use tempfile::tempdir;

#[test]
fn test_ensure_settings_file_writes_defaults_once() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join(SETTINGS_FILE);

    ensure_settings_file_at(&path).unwrap();
    let settings = read_settings(&path).unwrap();
    assert_eq!(settings, Settings::default());

    std::fs::write(&path, r#"{"tabs":{"max_tabs":3}}"#).unwrap();
    ensure_settings_file_at(&path).unwrap();
    let settings = read_settings(&path).unwrap();
    assert_eq!(settings.tabs.max_tabs, 3);
}

#[test]
fn test_read_settings_reports_parse_errors() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(SETTINGS_FILE);
    std::fs::write(&path, "{ not json").unwrap();

    let err = read_settings(&path).unwrap_err();
    assert!(matches!(err, SettingsError::Parse(_)));
}

#[test]
fn test_settings_path_location() {
    let path = get_settings_path().unwrap();
    assert!(path.ends_with(Path::new(SETTINGS_DIR).join(SETTINGS_FILE)));
}
