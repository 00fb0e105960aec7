use super::*;

#[test]
fn test_get_store_dir() {
    let dir = get_store_dir();
    // 测试环境里 HOME 总是存在
    assert!(dir.is_some());
    let dir = dir.unwrap();
    assert!(dir.to_string_lossy().contains(APP_NAME));
    assert!(dir.to_string_lossy().contains(STORE_DIR));
}

#[test]
fn test_get_log_dir() {
    let dir = get_log_dir();
    assert!(dir.is_some());
    let dir = dir.unwrap();
    assert!(dir.to_string_lossy().contains(APP_NAME));
    assert!(dir.to_string_lossy().contains(LOG_DIR));
}

#[test]
fn test_resolve_store_dir_prefers_explicit() {
    let explicit = Path::new("/tmp/stylelab-explicit");
    assert_eq!(resolve_store_dir(Some(explicit)), Some(explicit.to_path_buf()));
    assert_eq!(resolve_store_dir(None), get_store_dir());
}
