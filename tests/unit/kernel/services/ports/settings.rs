use super::*;
use crate::kernel::services::ports::BackendKind;
use crate::kernel::toast::Anchor;

#[test]
fn partial_settings_fall_back_to_defaults() {
    let json = r#"{
        "storage": { "namespace": "lab", "default_backend": "session" },
        "notifications": { "anchor": "bottom-left" },
        "keybindings": [{ "key": "ctrl+t", "command": "tab.new" }]
    }"#;
    let settings: Settings = serde_json::from_str(json).expect("deserialize Settings");

    assert_eq!(settings.storage.namespace, "lab");
    assert_eq!(settings.storage.default_backend, BackendKind::Session);
    assert_eq!(
        settings.storage.max_entry_bytes,
        StoreConfig::default().max_entry_bytes
    );
    assert_eq!(settings.notifications.anchor, Anchor::BottomLeft);
    assert_eq!(settings.notifications.max_visible, 5);
    assert_eq!(settings.tabs, TabConfig::default());
    assert_eq!(settings.keybindings.len(), 1);
    assert!(settings.challenges.is_empty());
}

#[test]
fn settings_serde_roundtrip_preserves_defaults() {
    let original = Settings::default();
    let json = serde_json::to_string_pretty(&original).expect("serialize Settings");
    let decoded: Settings = serde_json::from_str(&json).expect("deserialize Settings");
    assert_eq!(decoded, original);
}

#[test]
fn empty_object_is_valid_settings() {
    let settings: Settings = serde_json::from_str("{}").unwrap();
    assert_eq!(settings, Settings::default());
}
