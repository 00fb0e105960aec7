use super::*;
use serde_json::json;
use stylelab::core::ManualClock;
use stylelab::kernel::services::ports::StoreConfig;

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn memory_store() -> KeyValueStore {
    KeyValueStore::in_memory(StoreConfig::default(), ManualClock::new(0).shared())
}

fn run_text(store: &mut KeyValueStore, command: Command) -> Result<String, CliError> {
    let mut out = Vec::new();
    run_store_command(store, None, &command, &mut out)?;
    Ok(String::from_utf8(out).unwrap())
}

#[test]
fn parse_set_with_flags_anywhere() {
    let cli = parse_args(args(&[
        "--dir", "/tmp/s", "set", "--ttl", "500", "theme", r#"{"mode":"dark"}"#, "--compress",
    ]))
    .unwrap();
    assert_eq!(cli.dir, Some(PathBuf::from("/tmp/s")));
    assert_eq!(
        cli.command,
        Command::Set {
            key: "theme".into(),
            value: json!({"mode": "dark"}),
            ttl_ms: Some(500),
            compress: true,
            obfuscate: false,
        }
    );
}

#[test]
fn parse_value_falls_back_to_string() {
    assert_eq!(parse_value("42"), json!(42));
    assert_eq!(parse_value("dark"), json!("dark"));
}

#[test]
fn parse_errors_are_reported() {
    assert!(parse_args(args(&[])).is_err());
    assert!(parse_args(args(&["frobnicate"])).is_err());
    assert!(parse_args(args(&["get"])).is_err());
    assert!(parse_args(args(&["keys", "--bogus"])).is_err());
    assert!(parse_args(args(&["--backend", "cloud", "keys"])).is_err());
    assert!(parse_args(args(&["watch", "--interval", "0"])).is_err());
    assert!(parse_args(args(&["--dir"])).is_err());
}

#[test]
fn parse_sessions_and_help() {
    assert_eq!(parse_args(args(&["sessions"])).unwrap().command, Command::Sessions);
    assert_eq!(
        parse_args(args(&["sessions", "rm", "work"])).unwrap().command,
        Command::DeleteSession {
            name: "work".into()
        }
    );
    assert_eq!(parse_args(args(&["--help"])).unwrap().command, Command::Help);
    assert_eq!(
        parse_args(args(&["watch", "--interval", "250"])).unwrap().command,
        Command::Watch { interval_ms: 250 }
    );
}

#[test]
fn store_commands_round_trip_through_output() {
    let mut store = memory_store();
    run_text(
        &mut store,
        Command::Set {
            key: "b".into(),
            value: json!(1),
            ttl_ms: None,
            compress: false,
            obfuscate: true,
        },
    )
    .unwrap();
    store.set("a", json!("x"), SetOptions::new());

    assert_eq!(run_text(&mut store, Command::Keys).unwrap(), "a\nb\n");
    assert_eq!(
        run_text(&mut store, Command::Get { key: "b".into() }).unwrap(),
        "1\n"
    );
    assert!(run_text(&mut store, Command::Get { key: "zz".into() }).is_err());

    run_text(&mut store, Command::Remove { key: "a".into() }).unwrap();
    assert!(run_text(&mut store, Command::Remove { key: "a".into() }).is_err());
    assert!(run_text(&mut store, Command::Stats)
        .unwrap()
        .starts_with("entries: 1\n"));
}

#[test]
fn clear_with_yes_skips_prompt() {
    let mut store = memory_store();
    store.set_confirm(Box::new(|_: &str| false));
    store.set("a", json!(1), SetOptions::new());

    assert!(run_text(&mut store, Command::Clear { yes: false }).is_err());
    assert!(store.has("a", None));
    run_text(&mut store, Command::Clear { yes: true }).unwrap();
    assert!(!store.has("a", None));
}

#[test]
fn export_then_import_into_another_store() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("snapshot.json");

    let mut source = memory_store();
    source.set("theme", json!("dark"), SetOptions::new());
    run_text(
        &mut source,
        Command::Export {
            path: Some(file.clone()),
        },
    )
    .unwrap();

    let mut target = memory_store();
    target.set("theme", json!("light"), SetOptions::new());
    let report = run_text(
        &mut target,
        Command::Import {
            path: file.clone(),
            overwrite: false,
        },
    )
    .unwrap();
    assert_eq!(report, "imported 0 of 1 (1 skipped)\n");

    run_text(
        &mut target,
        Command::Import {
            path: file,
            overwrite: true,
        },
    )
    .unwrap();
    assert_eq!(target.get("theme", None), Some(json!("dark")));
}

#[test]
fn session_commands_list_and_delete() {
    let clock = ManualClock::new(1_000);
    let mut store = memory_store();
    let mut tabs = TabRegistry::new(Default::default(), clock.shared());
    tabs.ensure_tab();
    assert!(tabs.save_session(&mut store, "work"));

    let mut out = Vec::new();
    run_session_command(&mut store, &tabs, &Command::Sessions, &mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "work\t1 tabs\t1000\n");

    let delete = Command::DeleteSession {
        name: "work".into(),
    };
    run_session_command(&mut store, &tabs, &delete, &mut Vec::new()).unwrap();
    assert!(run_session_command(&mut store, &tabs, &delete, &mut Vec::new()).is_err());
}

#[test]
fn watch_output_covers_external_and_expired_changes() {
    let event = |origin| {
        PlatformEvent::Storage(StorageEvent::Changed {
            backend: BackendKind::Local,
            key: "theme".into(),
            origin,
        })
    };
    assert!(describe_event(&event(ChangeOrigin::External))
        .unwrap()
        .ends_with("theme changed externally"));
    assert!(describe_event(&event(ChangeOrigin::Expired))
        .unwrap()
        .ends_with("theme expired"));
    assert_eq!(describe_event(&event(ChangeOrigin::Local)), None);
}
