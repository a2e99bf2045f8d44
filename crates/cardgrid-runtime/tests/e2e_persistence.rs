#![forbid(unsafe_code)]

//! End-to-end persistence through real files.
//!
//! Each test drives a [`CardDeck`] over a [`FileStorage`] rooted in a
//! temporary directory, then inspects the directory or builds a second deck
//! over it, the way a page reload would.

use cardgrid_core::{
    Card, CardContent, CardId, CardKind, Density, DensityAction, ManualClock, Priority, Timestamp,
};
use cardgrid_layout::{LayoutSnapshot, Viewport};
use cardgrid_runtime::{
    CardDeck, FileStorage, MemoryStorage, NoticeKind, StorageBackend, decode_snapshot,
};

fn clock() -> ManualClock {
    ManualClock::new(Timestamp::from_millis(1_750_000_000_000))
}

fn build<S: StorageBackend>(storage: S, clock: &ManualClock) -> CardDeck<CardContent, S> {
    CardDeck::builder(storage)
        .clock(clock.clone())
        .card(
            Card::new("institutional", CardKind::Institutional),
            CardContent::new("Documentation").metric("Pages", "142"),
        )
        .card(
            Card::new("creator", CardKind::Creator),
            CardContent::new("Studio").badge("New"),
        )
        .card(
            Card::new("personal", CardKind::Personal),
            CardContent::new("About"),
        )
        .card(
            Card::new("ai", CardKind::Ai).with_priority(Priority::High),
            CardContent::new("Assistant").primary_action("Ask", "/ai"),
        )
        .build()
        .unwrap()
}

fn id(s: &str) -> CardId {
    CardId::from(s)
}

fn stored(dir: &std::path::Path) -> LayoutSnapshot {
    let text = std::fs::read_to_string(dir.join("cardgrid.layout.json")).unwrap();
    decode_snapshot(&text).unwrap()
}

#[test]
fn burst_of_changes_is_written_once() {
    let dir = tempfile::tempdir().unwrap();
    let clock = clock();
    let mut deck = build(FileStorage::new(dir.path()), &clock);

    deck.set_customizing(true);
    for _ in 0..5 {
        deck.move_card(0, 3);
        clock.advance(100);
        assert!(!deck.tick().saved);
    }
    assert!(!dir.path().join("cardgrid.layout.json").exists());

    clock.advance(400);
    assert!(deck.tick().saved);
    assert_eq!(deck.save_count(), 1);

    let snapshot = stored(dir.path());
    let order: Vec<&str> = snapshot.cards.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(order, ["creator", "personal", "ai", "institutional"]);
}

#[test]
fn reload_restores_the_arrangement() {
    let dir = tempfile::tempdir().unwrap();
    let clock = clock();
    {
        let mut first = build(FileStorage::new(dir.path()), &clock);
        first.apply_density(&id("creator"), DensityAction::Advance);
        first.set_priority(&id("personal"), Priority::Pinned);
        first.set_column_override(Some(2));
        first.set_customizing(true);
        first.begin_drag(&id("personal")).unwrap();
        first.drag_over(0);
        first.end_drag().unwrap();
        assert!(first.flush());
    }

    let mut second = build(FileStorage::new(dir.path()), &clock);
    assert_eq!(second.order()[0], id("personal"));
    assert_eq!(second.card(&id("creator")).unwrap().density, Density::Expanded);
    assert_eq!(second.card(&id("personal")).unwrap().priority, Priority::Pinned);
    assert_eq!(second.column_override(), Some(2));
    // Content comes from the caller, never from storage.
    assert_eq!(second.content(&id("creator")).unwrap().badge.as_deref(), Some("New"));
    let kinds: Vec<NoticeKind> = second.drain_notices().into_iter().map(|n| n.kind).collect();
    assert_eq!(kinds, vec![NoticeKind::LayoutRestored]);
}

#[test]
fn removed_and_added_cards_merge_with_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let stale = r#"{
        "version": 1,
        "cards": [
            { "id": "ai", "order": 0, "density": "compact", "priority": "normal" },
            { "id": "retired", "order": 1, "density": "expanded", "priority": "pinned" },
            { "id": "institutional", "order": 2, "density": "standard", "priority": "normal" }
        ],
        "gridColumns": null,
        "autoCollapseSettings": { "enabled": false, "collapsePercentage": 25 },
        "savedAt": "2025-06-15T12:00:00Z"
    }"#;
    std::fs::write(dir.path().join("cardgrid.layout.json"), stale).unwrap();

    let clock = clock();
    let deck = build(FileStorage::new(dir.path()), &clock);
    let order: Vec<&str> = deck.cards().map(|c| c.id.as_str()).collect();
    assert_eq!(order, ["ai", "creator", "institutional", "personal"]);
    assert_eq!(deck.card(&id("ai")).unwrap().density, Density::Compact);
    assert!(deck.card(&id("retired")).is_none());
    assert!(!deck.auto_collapse_settings().enabled);
    assert_eq!(deck.auto_collapse_settings().undo_window_ms, 10_000);
}

#[test]
fn corrupt_file_falls_back_and_is_left_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cardgrid.layout.json");
    std::fs::write(&path, "{ not json").unwrap();

    let clock = clock();
    let mut deck = build(FileStorage::new(dir.path()), &clock);
    assert_eq!(deck.order()[0], id("institutional"));
    assert!(deck.drain_notices().is_empty());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");

    // The next save overwrites it with a valid layout.
    deck.set_priority(&id("creator"), Priority::High);
    assert!(deck.flush());
    assert_eq!(stored(dir.path()).cards.len(), 4);
}

#[test]
fn reset_deletes_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let clock = clock();
    let mut deck = build(FileStorage::new(dir.path()), &clock);
    deck.set_column_override(Some(1));
    assert!(deck.flush());
    assert!(dir.path().join("cardgrid.layout.json").exists());

    deck.reset();
    assert!(!dir.path().join("cardgrid.layout.json").exists());
    clock.advance(10_000);
    assert!(!deck.tick().saved);
    assert_eq!(deck.column_override(), None);
}

#[test]
fn export_moves_a_layout_between_stores() {
    let clock = clock();
    let mut source = build(MemoryStorage::new(), &clock);
    source.set_customizing(true);
    source.move_card(3, 1);
    source.set_customizing(false);
    source.apply_density(&id("institutional"), DensityAction::CollapseOne);

    let file = source.export().unwrap();
    assert_eq!(file.file_name, "cardgrid-layout-20250615-150640.json");
    assert!(file.contents.contains("\n  \"version\": 1"));

    let dir = tempfile::tempdir().unwrap();
    let mut target = build(FileStorage::new(dir.path()), &clock);
    target.import(&file.contents).unwrap();
    assert_eq!(target.order(), source.order());
    assert!(target.flush());
    assert_eq!(stored(dir.path()).cards, source.snapshot().cards);
}

#[test]
fn narrow_screen_collapse_survives_reload_and_undo_expires() {
    let dir = tempfile::tempdir().unwrap();
    let clock = clock();
    let mut deck = build(FileStorage::new(dir.path()), &clock);

    deck.resize(Viewport::new(375, 600));
    clock.advance(150);
    let report = deck.tick();
    assert!(report.evaluated);
    assert!(report.collapsed > 0);
    assert!(deck.collapse_record().is_some());

    clock.advance(10_000);
    let report = deck.tick();
    assert!(report.undo_expired);
    assert!(report.saved);
    assert!(deck.undo_auto_collapse().is_none());

    let collapsed: Vec<CardId> = deck
        .cards()
        .filter(|c| c.density == Density::Compact)
        .map(|c| c.id.clone())
        .collect();
    let reloaded = build(FileStorage::new(dir.path()), &clock);
    for card in &collapsed {
        assert_eq!(reloaded.card(card).unwrap().density, Density::Compact);
    }
}

#[test]
fn quota_failure_is_reported_once_and_deck_keeps_working() {
    let clock = clock();
    let mut deck = build(MemoryStorage::new().with_quota(64), &clock);
    deck.set_priority(&id("creator"), Priority::Pinned);
    assert!(!deck.flush());
    deck.set_priority(&id("creator"), Priority::Normal);
    clock.advance(2_000);
    assert!(!deck.flush());

    let warnings: Vec<_> = deck
        .drain_notices()
        .into_iter()
        .filter(|n| matches!(n.kind, NoticeKind::PersistenceUnavailable { .. }))
        .collect();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.starts_with("Layout changes will not be saved"));
    assert_eq!(deck.card(&id("creator")).unwrap().priority, Priority::Normal);
}
