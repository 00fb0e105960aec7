use super::*;
use crate::core::event::{Key, KeyCode};
use crate::core::ManualClock;
use crate::kernel::event::PlatformEvent;
use crate::kernel::services::event_bus;
use crate::kernel::services::ports::{KeybindingRule, StoreConfig};
use std::cell::RefCell;
use std::rc::Rc;

fn registry(clock: &ManualClock) -> TabRegistry {
    TabRegistry::new(TabConfig::default(), clock.shared())
}

fn open(tabs: &mut TabRegistry, title: &str) -> TabId {
    tabs.create_tab(title, "playground", false, None).unwrap()
}

fn titles(tabs: &TabRegistry) -> Vec<String> {
    tabs.tabs().iter().map(|t| t.title.clone()).collect()
}

#[test]
fn first_tab_is_activated_and_later_ones_only_on_request() {
    let clock = ManualClock::new(0);
    let mut tabs = registry(&clock);
    let a = open(&mut tabs, "a");
    let b = open(&mut tabs, "b");
    assert_eq!(tabs.active_id(), Some(a));

    let c = tabs.create_tab("c", "playground", true, Some("<p>".into())).unwrap();
    assert_eq!(tabs.active_id(), Some(c));
    assert_eq!(tabs.get(c).unwrap().content, "<p>");
    assert_ne!(b, c);
}

#[test]
fn create_rejects_beyond_max_tabs() {
    let clock = ManualClock::new(0);
    let (tx, mut rx) = event_bus();
    let mut tabs = registry(&clock).with_events(EventSink::new(tx));

    for i in 0..10 {
        assert!(tabs.create_tab(&format!("t{}", i), "", false, None).is_some());
    }
    assert_eq!(tabs.create_tab("t10", "", false, None), None);
    assert_eq!(tabs.len(), 10);
    assert!(rx
        .drain()
        .contains(&PlatformEvent::Tab(TabEvent::LimitReached { max_tabs: 10 })));
}

#[test]
fn blank_title_and_kind_fall_back_to_defaults() {
    let clock = ManualClock::new(0);
    let mut tabs = registry(&clock);
    let id = tabs.create_tab("  ", "", true, None).unwrap();
    let tab = tabs.get(id).unwrap();
    assert_eq!(tab.title, "Untitled");
    assert_eq!(tab.kind, "playground");
}

#[test]
fn activate_unknown_fails_and_same_is_noop() {
    let clock = ManualClock::new(0);
    let (tx, mut rx) = event_bus();
    let mut tabs = registry(&clock).with_events(EventSink::new(tx));
    let a = open(&mut tabs, "a");
    rx.drain();

    assert!(tabs.activate_tab(a));
    assert!(rx.drain().is_empty());
    assert!(!tabs.activate_tab(TabId::new(99)));
}

#[test]
fn closing_active_prefers_following_neighbor() {
    let clock = ManualClock::new(0);
    let mut tabs = registry(&clock);
    let a = open(&mut tabs, "a");
    let b = open(&mut tabs, "b");
    let c = open(&mut tabs, "c");

    tabs.activate_tab(b);
    assert!(tabs.close_tab(b, false));
    assert_eq!(tabs.active_id(), Some(c));

    assert!(tabs.close_tab(c, false));
    assert_eq!(tabs.active_id(), Some(a));
}

#[test]
fn closing_last_tab_creates_default() {
    let clock = ManualClock::new(0);
    let mut tabs = registry(&clock);
    let only = tabs.ensure_tab().unwrap();
    assert_eq!(tabs.ensure_tab(), None);

    assert!(tabs.close_tab(only, false));
    assert_eq!(tabs.len(), 1);
    let fresh = tabs.active_tab().unwrap();
    assert_ne!(fresh.id, only);
    assert_eq!(fresh.title, "Untitled");
}

#[test]
fn dirty_tab_needs_confirmation_unless_forced() {
    let clock = ManualClock::new(0);
    let mut tabs = registry(&clock);
    let a = open(&mut tabs, "a");
    let b = open(&mut tabs, "draft");
    assert!(tabs.update_content(b, "body { color: red }"));
    assert!(tabs.get(b).unwrap().modified);

    let prompts = Rc::new(RefCell::new(Vec::new()));
    let seen = Rc::clone(&prompts);
    tabs.set_confirm(Box::new(move |prompt: &str| {
        seen.borrow_mut().push(prompt.to_string());
        false
    }));
    assert!(!tabs.close_tab(b, false));
    assert_eq!(tabs.len(), 2);
    assert!(prompts.borrow()[0].contains("draft"));

    // Clean tabs never ask.
    assert!(tabs.close_tab(a, false));
    assert_eq!(prompts.borrow().len(), 1);

    assert!(tabs.close_tab(b, true));
    assert_eq!(prompts.borrow().len(), 1);
}

#[test]
fn reorder_moves_tab_and_keeps_active() {
    let clock = ManualClock::new(0);
    let mut tabs = registry(&clock);
    let a = open(&mut tabs, "a");
    open(&mut tabs, "b");
    open(&mut tabs, "c");

    assert!(tabs.reorder(a, 2));
    assert_eq!(titles(&tabs), vec!["b", "c", "a"]);
    assert_eq!(tabs.active_id(), Some(a));
    assert_eq!(tabs.active_index(), Some(2));

    // Clamped past the end, no-op when already there.
    assert!(!tabs.reorder(a, 10));
    assert!(!tabs.reorder(TabId::new(42), 0));
}

#[test]
fn reorder_active_to_front() {
    let clock = ManualClock::new(0);
    let mut tabs = registry(&clock);
    open(&mut tabs, "a");
    let b = open(&mut tabs, "b");
    open(&mut tabs, "c");
    tabs.activate_tab(b);

    assert!(tabs.reorder(b, 0));
    assert_eq!(titles(&tabs), vec!["b", "a", "c"]);
    assert_eq!(tabs.active_index(), Some(0));
}

#[test]
fn rename_and_duplicate() {
    let clock = ManualClock::new(0);
    let mut tabs = registry(&clock);
    let a = open(&mut tabs, "a");
    open(&mut tabs, "b");

    assert!(tabs.rename(a, " Grid "));
    assert!(!tabs.rename(a, "   "));
    assert_eq!(tabs.get(a).unwrap().title, "Grid");

    tabs.update_content(a, ".row {}");
    let copy = tabs.duplicate(a).unwrap();
    assert_eq!(titles(&tabs), vec!["Grid", "Grid (copy)", "b"]);
    assert_eq!(tabs.active_id(), Some(copy));
    let copy = tabs.get(copy).unwrap();
    assert_eq!(copy.content, ".row {}");
    assert!(copy.modified);
}

#[test]
fn keyboard_navigation_wraps() {
    let clock = ManualClock::new(0);
    let mut tabs = registry(&clock);
    let a = open(&mut tabs, "a");
    let b = open(&mut tabs, "b");
    let c = open(&mut tabs, "c");

    assert!(tabs.previous());
    assert_eq!(tabs.active_id(), Some(c));
    assert!(tabs.next());
    assert_eq!(tabs.active_id(), Some(a));
    assert!(tabs.last());
    assert_eq!(tabs.active_id(), Some(c));
    assert!(tabs.first());
    assert!(tabs.activate_index(1));
    assert_eq!(tabs.active_id(), Some(b));
    assert!(!tabs.activate_index(3));
}

#[test]
fn keymap_resolves_defaults_and_rules() {
    let mut keymap = TabKeymap::with_defaults();
    assert_eq!(keymap.resolve(&Key::ctrl(KeyCode::Tab)), Some(TabCommand::Next));
    assert_eq!(
        keymap.resolve(&Key::ctrl_shift(KeyCode::Tab)),
        Some(TabCommand::Previous)
    );
    assert_eq!(
        keymap.resolve(&Key::alt(KeyCode::Char('3'))),
        Some(TabCommand::Select(2))
    );

    let applied = keymap.apply_rules(&[
        KeybindingRule {
            key: "ctrl+w".into(),
            command: "none".into(),
        },
        KeybindingRule {
            key: "ctrl+shift+w".into(),
            command: "tab.close".into(),
        },
        KeybindingRule {
            key: "ctrl+k".into(),
            command: "editor.format".into(),
        },
        KeybindingRule {
            key: "ctrl+".into(),
            command: "tab.new".into(),
        },
    ]);
    assert_eq!(applied, 2);
    assert_eq!(keymap.resolve(&Key::ctrl(KeyCode::Char('w'))), None);
    assert_eq!(
        keymap.resolve(&Key::ctrl_shift(KeyCode::Char('w'))),
        Some(TabCommand::Close)
    );
    assert_eq!(keymap.resolve(&Key::ctrl(KeyCode::Char('k'))), None);
}

#[test]
fn command_names_round_trip() {
    for command in [
        TabCommand::New,
        TabCommand::Close,
        TabCommand::Select(4),
        TabCommand::MoveRight,
    ] {
        assert_eq!(TabCommand::from_name(&command.name()), Some(command));
    }
    assert_eq!(TabCommand::from_name("tab.select.0"), None);
}

#[test]
fn execute_commands() {
    let clock = ManualClock::new(0);
    let mut tabs = registry(&clock);
    tabs.ensure_tab();

    assert!(tabs.execute(TabCommand::New));
    assert_eq!(tabs.len(), 2);
    assert_eq!(tabs.active_index(), Some(1));

    assert!(tabs.execute(TabCommand::MoveLeft));
    assert_eq!(tabs.active_index(), Some(0));
    assert!(!tabs.execute(TabCommand::MoveLeft));

    assert!(tabs.execute(TabCommand::Close));
    assert_eq!(tabs.len(), 1);
}

#[test]
fn drag_drop_reorders_and_outside_release_is_noop() {
    let clock = ManualClock::new(0);
    let mut tabs = registry(&clock);
    let a = open(&mut tabs, "a");
    open(&mut tabs, "b");
    open(&mut tabs, "c");

    assert!(tabs.begin_drag(a));
    assert!(tabs.drag_over(1));
    assert!(!tabs.drag_over(7));
    assert!(!tabs.drop_drag());
    assert_eq!(titles(&tabs), vec!["a", "b", "c"]);
    assert_eq!(tabs.drag(), None);

    tabs.begin_drag(a);
    tabs.drag_over(2);
    assert!(tabs.drop_drag());
    assert_eq!(titles(&tabs), vec!["b", "c", "a"]);

    tabs.begin_drag(a);
    tabs.drag_over(0);
    tabs.cancel_drag();
    assert!(!tabs.drop_drag());
    assert_eq!(titles(&tabs), vec!["b", "c", "a"]);
}

#[test]
fn sessions_save_list_restore_and_delete() {
    let clock = ManualClock::new(5_000);
    let mut store = KeyValueStore::in_memory(StoreConfig::default(), clock.shared());
    let mut tabs = registry(&clock);
    open(&mut tabs, "layout");
    let b = open(&mut tabs, "colors");
    tabs.update_content(b, ":root { --x: 1 }");
    tabs.activate_tab(b);

    assert!(tabs.save_session(&mut store, "work"));
    assert!(!tabs.save_session(&mut store, " "));
    let sessions = tabs.list_sessions(&mut store);
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].timestamp, 5_000);

    tabs.close_tab(b, true);
    open(&mut tabs, "scratch");
    let work = tabs.find_session(&mut store, "work").unwrap();
    assert!(tabs.restore_session(&work));

    assert_eq!(titles(&tabs), vec!["layout", "colors"]);
    let active = tabs.active_tab().unwrap();
    assert_eq!(active.title, "colors");
    assert!(active.modified);
    assert_eq!(active.content, ":root { --x: 1 }");

    assert!(tabs.delete_session(&mut store, "work"));
    assert!(!tabs.delete_session(&mut store, "work"));
    assert!(tabs.list_sessions(&mut store).is_empty());
}

#[test]
fn session_list_is_bounded_and_names_are_unique() {
    let clock = ManualClock::new(0);
    let mut store = KeyValueStore::in_memory(StoreConfig::default(), clock.shared());
    let mut tabs = TabRegistry::new(
        TabConfig {
            max_sessions: 2,
            ..TabConfig::default()
        },
        clock.shared(),
    );
    tabs.ensure_tab();

    for name in ["one", "two", "one", "three"] {
        clock.advance(1);
        assert!(tabs.save_session(&mut store, name));
    }
    let names: Vec<String> = tabs
        .list_sessions(&mut store)
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(names, vec!["one", "three"]);
}

#[test]
fn persist_and_load_current_layout() {
    let clock = ManualClock::new(0);
    let mut store = KeyValueStore::in_memory(StoreConfig::default(), clock.shared());
    let mut tabs = registry(&clock);
    open(&mut tabs, "a");
    let b = open(&mut tabs, "b");
    tabs.activate_tab(b);
    assert!(tabs.persist(&mut store));

    let mut reloaded = registry(&clock);
    assert!(reloaded.load(&mut store));
    assert_eq!(titles(&reloaded), vec!["a", "b"]);
    assert_eq!(reloaded.active_tab().unwrap().title, "b");

    let mut empty_store = KeyValueStore::in_memory(StoreConfig::default(), clock.shared());
    let mut fresh = registry(&clock);
    assert!(!fresh.load(&mut empty_store));
    assert!(fresh.is_empty());
}

#[test]
fn session_json_shape() {
    let session = TabSession {
        name: "demo".into(),
        tabs: vec![TabSnapshot {
            id: TabId::new(3),
            title: "Flex".into(),
            kind: "playground".into(),
            content: String::new(),
            modified: false,
        }],
        active_tab: Some(TabId::new(3)),
        timestamp: 42,
    };
    let value = serde_json::to_value(&session).unwrap();
    assert_eq!(value["activeTab"], 3);
    assert_eq!(value["tabs"][0]["id"], 3);
    assert_eq!(value["timestamp"], 42);
}

#[test]
fn restore_truncates_to_max_tabs() {
    let clock = ManualClock::new(0);
    let mut tabs = TabRegistry::new(
        TabConfig {
            max_tabs: 2,
            ..TabConfig::default()
        },
        clock.shared(),
    );
    let session = TabSession {
        name: "big".into(),
        tabs: (0..4)
            .map(|i| TabSnapshot {
                id: TabId::new(i),
                title: format!("t{}", i),
                kind: "playground".into(),
                content: String::new(),
                modified: false,
            })
            .collect(),
        active_tab: Some(TabId::new(3)),
        timestamp: 0,
    };
    assert!(tabs.restore_session(&session));
    assert_eq!(titles(&tabs), vec!["t0", "t1"]);
    assert_eq!(tabs.active_index(), Some(0));
}

#[test]
fn zero_max_tabs_still_keeps_one_tab() {
    let clock = ManualClock::new(0);
    let mut tabs = TabRegistry::new(
        TabConfig {
            max_tabs: 0,
            ..TabConfig::default()
        },
        clock.shared(),
    );
    assert_eq!(tabs.config().max_tabs, 1);

    let only = tabs.ensure_tab().unwrap();
    assert_eq!(tabs.active_id(), Some(only));
    assert_eq!(tabs.create_tab("more", "playground", true, None), None);

    assert!(tabs.close_tab(only, true));
    assert_eq!(tabs.len(), 1);
    assert!(tabs.active_id().is_some());
}
