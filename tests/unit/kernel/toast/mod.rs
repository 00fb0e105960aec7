use super::*;
use crate::core::{Clock, ManualClock};
use crate::kernel::event::PlatformEvent;
use crate::kernel::services::event_bus;
use std::cell::Cell;
use std::rc::Rc;

fn queue_with(clock: &ManualClock, config: ToastConfig) -> NotificationQueue {
    NotificationQueue::new(config, clock.shared())
}

fn ungrouped() -> ToastConfig {
    ToastConfig {
        group_similar: false,
        ..ToastConfig::default()
    }
}

#[test]
fn test_overflow_is_bounded_and_promotes_on_hide() {
    let clock = ManualClock::new(0);
    let mut queue = queue_with(
        &clock,
        ToastConfig {
            max_visible: 3,
            queue_limit: 2,
            ..ungrouped()
        },
    );

    let ids: Vec<ToastId> = (0..7)
        .map(|i| queue.show(format!("msg {}", i), ToastKind::Info, ToastOptions::new()))
        .collect();
    assert_eq!(queue.active_len(), 3);
    assert_eq!(queue.queued_len(), 2);
    // Oldest queued entries were evicted.
    let queued: Vec<ToastId> = queue.queued().map(|n| n.id()).collect();
    assert_eq!(queued, vec![ids[5], ids[6]]);

    assert!(queue.hide(ids[0]));
    assert_eq!(queue.active_len(), 3);
    assert_eq!(queue.queued_len(), 1);
    assert!(queue.active().any(|n| n.id() == ids[5]));
    assert!(matches!(
        queue.get(ids[5]).unwrap().state(),
        ToastState::Running { .. }
    ));
    assert_eq!(queue.get(ids[6]).unwrap().state(), ToastState::Queued);
}

#[test]
fn test_grouping_resets_timer_and_counts() {
    let clock = ManualClock::new(0);
    let mut queue = queue_with(&clock, ToastConfig::default());

    let first = queue.show("Saved", ToastKind::Success, ToastOptions::new());
    clock.advance(2_000);
    let second = queue.show("Saved", ToastKind::Success, ToastOptions::new().duration(7_000));

    assert_eq!(first, second);
    assert_eq!(queue.active_len(), 1);
    let toast = queue.get(first).unwrap();
    assert_eq!(toast.count(), 2);
    assert_eq!(toast.state().deadline(), Some(9_000));

    // Same message, different kind is a separate toast.
    queue.show("Saved", ToastKind::Info, ToastOptions::new());
    assert_eq!(queue.active_len(), 2);
}

#[test]
fn test_default_durations_and_timeout() {
    let clock = ManualClock::new(0);
    let mut queue = queue_with(&clock, ToastConfig::default());

    let success = queue.show("ok", ToastKind::Success, ToastOptions::new());
    let error = queue.show("bad", ToastKind::Error, ToastOptions::new());
    let loading = queue.show("wait", ToastKind::Loading, ToastOptions::new());
    assert_eq!(queue.get(loading).unwrap().state(), ToastState::Persistent);

    clock.advance(2_999);
    assert!(queue.tick().is_empty());
    clock.advance(1);
    assert_eq!(queue.tick(), vec![success]);
    clock.advance(3_000);
    assert_eq!(queue.tick(), vec![error]);

    clock.advance(1_000_000);
    assert!(queue.tick().is_empty());
    assert_eq!(queue.active_len(), 1);
}

#[test]
fn test_pause_all_preserves_remaining_time() {
    let clock = ManualClock::new(0);
    let mut queue = queue_with(&clock, ToastConfig::default());
    let id = queue.show("note", ToastKind::Info, ToastOptions::new().duration(1_000));

    clock.advance(400);
    queue.pause_all();
    assert!(queue.get(id).unwrap().is_paused());
    assert_eq!(queue.get(id).unwrap().state().remaining(clock.now_ms()), Some(600));

    clock.advance(10_000);
    assert!(queue.tick().is_empty());
    // Hover cannot resume while the window is blurred.
    assert!(!queue.resume(id));

    queue.resume_all();
    clock.advance(599);
    assert!(queue.tick().is_empty());
    clock.advance(1);
    assert_eq!(queue.tick(), vec![id]);
}

#[test]
fn test_toasts_shown_while_suspended_start_paused() {
    let clock = ManualClock::new(0);
    let mut queue = queue_with(&clock, ToastConfig::default());
    queue.pause_all();
    let id = queue.show("later", ToastKind::Warning, ToastOptions::new());
    assert_eq!(queue.get(id).unwrap().state(), ToastState::Paused { remaining: 5_000 });
}

#[test]
fn test_pause_single_on_hover() {
    let clock = ManualClock::new(0);
    let mut queue = queue_with(&clock, ToastConfig::default());
    let hovered = queue.show("a", ToastKind::Info, ToastOptions::new().duration(100));
    let other = queue.show("b", ToastKind::Info, ToastOptions::new().duration(100));

    assert!(queue.pause(hovered));
    assert!(!queue.pause(hovered));
    clock.advance(100);
    assert_eq!(queue.tick(), vec![other]);

    assert!(queue.resume(hovered));
    clock.advance(100);
    assert_eq!(queue.tick(), vec![hovered]);
}

#[test]
fn test_clear_by_kind() {
    let clock = ManualClock::new(0);
    let mut queue = queue_with(
        &clock,
        ToastConfig {
            max_visible: 2,
            ..ungrouped()
        },
    );
    queue.show("e1", ToastKind::Error, ToastOptions::new());
    queue.show("i1", ToastKind::Info, ToastOptions::new());
    queue.show("e2", ToastKind::Error, ToastOptions::new());
    queue.show("i2", ToastKind::Info, ToastOptions::new());

    assert_eq!(queue.clear(Some(ToastKind::Error)), 2);
    let kinds: Vec<ToastKind> = queue.active().map(|n| n.kind()).collect();
    assert_eq!(kinds, vec![ToastKind::Info, ToastKind::Info]);
    assert_eq!(queue.queued_len(), 0);

    assert_eq!(queue.clear(None), 2);
    assert_eq!(queue.active_len(), 0);
}

#[test]
fn test_failing_click_handler_still_dismisses() {
    let clock = ManualClock::new(0);
    let mut queue = queue_with(&clock, ToastConfig::default());
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let id = queue.show(
        "Undo?",
        ToastKind::Info,
        ToastOptions::new().on_click(move |_| {
            counter.set(counter.get() + 1);
            Err("handler exploded".into())
        }),
    );

    assert!(queue.click(id));
    assert_eq!(calls.get(), 1);
    assert!(queue.get(id).is_none());
    assert!(!queue.click(id));
}

#[test]
fn test_exit_animation_retired_on_tick() {
    let clock = ManualClock::new(0);
    let mut queue = queue_with(&clock, ToastConfig::default());
    let id = queue.show("bye", ToastKind::Info, ToastOptions::new());
    queue.hide(id);
    assert_eq!(
        queue.exiting(),
        &[Exiting {
            id,
            finishes_at: 300
        }]
    );
    clock.advance(300);
    queue.tick();
    assert!(queue.exiting().is_empty());
}

#[test]
fn test_placements_grow_away_from_anchor() {
    let clock = ManualClock::new(0);
    let mut queue = queue_with(&clock, ungrouped());
    let a = queue.show("a", ToastKind::Info, ToastOptions::new());
    clock.advance(1);
    let b = queue.show("b", ToastKind::Info, ToastOptions::new());
    clock.advance(1);
    let c = queue.show("c", ToastKind::Info, ToastOptions::new());
    queue.set_height(a, 40);

    let placements = queue.placements();
    let offsets: Vec<(ToastId, u32)> = placements.iter().map(|p| (p.id, p.offset)).collect();
    assert_eq!(offsets, vec![(a, 0), (b, 48), (c, 120)]);
    assert!(placements.iter().all(|p| p.direction == StackDirection::Down));

    queue.hide(a);
    queue.set_anchor(Anchor::BottomLeft);
    let placements = queue.placements();
    assert_eq!(placements[0].id, b);
    assert_eq!(placements[0].offset, 0);
    assert_eq!(placements[1].offset, 72);
    assert!(placements.iter().all(|p| p.direction == StackDirection::Up));
}

#[test]
fn test_anchor_json_names() {
    assert_eq!(serde_json::to_string(&Anchor::BottomCenter).unwrap(), "\"bottom-center\"");
    let anchor: Anchor = serde_json::from_str("\"top-left\"").unwrap();
    assert_eq!(anchor, Anchor::TopLeft);
    assert_eq!(ToastKind::parse("warning"), Some(ToastKind::Warning));
}

#[test]
fn test_lifecycle_events() {
    let clock = ManualClock::new(0);
    let (tx, mut rx) = event_bus();
    let mut queue = NotificationQueue::new(
        ToastConfig {
            max_visible: 1,
            queue_limit: 1,
            ..ToastConfig::default()
        },
        clock.shared(),
    )
    .with_events(EventSink::new(tx));

    let a = queue.show("a", ToastKind::Info, ToastOptions::new());
    queue.show("a", ToastKind::Info, ToastOptions::new());
    let b = queue.show("b", ToastKind::Info, ToastOptions::new());
    let c = queue.show("c", ToastKind::Info, ToastOptions::new());
    queue.hide(a);

    let names: Vec<&str> = rx.drain().iter().map(PlatformEvent::name).collect();
    assert_eq!(
        names,
        vec![
            "toast:created",
            "toast:grouped",
            "toast:created",
            "toast:queued",
            "toast:created",
            "toast:dropped",
            "toast:queued",
            "toast:removed",
            "toast:promoted",
        ]
    );
    assert!(queue.get(b).is_none());
    assert_eq!(queue.active().next().map(|n| n.id()), Some(c));
}

#[test]
fn test_zero_max_visible_still_shows_one() {
    let clock = ManualClock::new(0);
    let mut queue = queue_with(
        &clock,
        ToastConfig {
            max_visible: 0,
            ..ungrouped()
        },
    );
    assert_eq!(queue.config().max_visible, 1);

    let first = queue.show("first", ToastKind::Info, ToastOptions::new());
    queue.show("second", ToastKind::Info, ToastOptions::new());
    assert_eq!(queue.active_len(), 1);
    assert_eq!(queue.queued_len(), 1);
    assert!(queue.get(first).is_some());

    clock.advance(4_000);
    queue.tick();
    assert_eq!(queue.active_len(), 1);
    assert_eq!(queue.queued_len(), 0);
}

#[test]
fn test_grouped_repeat_keeps_hovered_toast_paused() {
    let clock = ManualClock::new(0);
    let mut queue = queue_with(&clock, ToastConfig::default());
    let id = queue.show("Saved", ToastKind::Success, ToastOptions::new());

    clock.advance(1_000);
    assert!(queue.pause(id));
    assert_eq!(queue.show("Saved", ToastKind::Success, ToastOptions::new()), id);
    assert_eq!(
        queue.get(id).unwrap().state(),
        ToastState::Paused { remaining: 3_000 }
    );

    clock.advance(10_000);
    assert!(queue.tick().is_empty());
    assert!(queue.get(id).unwrap().is_paused());
    assert_eq!(queue.get(id).unwrap().count(), 2);

    assert!(queue.resume(id));
    clock.advance(2_999);
    assert!(queue.tick().is_empty());
    clock.advance(1);
    assert_eq!(queue.tick(), vec![id]);
}
