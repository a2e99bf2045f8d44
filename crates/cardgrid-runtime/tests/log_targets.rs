#![forbid(unsafe_code)]

//! Log target and level policy.
//!
//! Verify that the deck's log events follow the project's logging policy:
//! - Every event uses a `cardgrid.*` target
//! - State changes worth auditing (auto-collapse, undo, reorder, import) are INFO
//! - Per-card and per-save chatter is DEBUG
//! - Recoverable storage problems are WARN, never ERROR
//! - Every event at DEBUG and above carries structured fields
//!
//! Run:
//!   cargo test -p cardgrid-runtime --test log_targets

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use cardgrid_core::{Card, CardId, CardKind, DensityAction, ManualClock, Timestamp};
use cardgrid_layout::Viewport;
use cardgrid_runtime::{CardDeck, MemoryStorage};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

// ============================================================================
// Test Infrastructure
// ============================================================================

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: tracing::Level,
    target: String,
    fields: HashMap<String, String>,
}

impl CapturedEvent {
    fn message(&self) -> &str {
        self.fields.get("message").map_or("", String::as_str)
    }

    fn has_structured_fields(&self) -> bool {
        self.fields.keys().any(|k| k != "message")
    }
}

struct EventCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S> tracing_subscriber::Layer<S> for EventCapture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            fields: visitor.0.into_iter().collect(),
        });
    }
}

fn with_captured_events<F: FnOnce()>(f: F) -> Vec<CapturedEvent> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let layer = EventCapture {
        events: events.clone(),
    };
    let subscriber = tracing_subscriber::registry()
        .with(tracing_subscriber::filter::LevelFilter::TRACE)
        .with(layer);
    tracing::subscriber::with_default(subscriber, f);
    let captured = events.lock().unwrap().clone();
    captured
}

fn session() -> Vec<CapturedEvent> {
    with_captured_events(|| {
        let clock = ManualClock::new(Timestamp::from_millis(5_000));
        let storage = MemoryStorage::new();
        let mut deck = CardDeck::builder(storage.clone())
            .clock(clock.clone())
            .cards(
                ["institutional", "creator", "personal", "ai"]
                    .into_iter()
                    .map(|name| (Card::new(name, CardKind::Creator), ())),
            )
            .build()
            .unwrap();

        deck.evaluate_space(Viewport::new(375, 600));
        deck.undo_auto_collapse();
        deck.apply_density(&CardId::from("ai"), DensityAction::Advance);
        deck.set_customizing(true);
        deck.move_card(0, 2);
        deck.flush();

        storage.set_unavailable(Some("quota"));
        deck.move_card(2, 0);
        deck.flush();

        let export = deck.export().unwrap();
        deck.import(&export.contents).unwrap();
        deck.import("[]").unwrap_err();
    })
}

// ============================================================================
// Policy Tests
// ============================================================================

#[test]
fn every_event_uses_a_cardgrid_target() {
    let events = session();
    assert!(!events.is_empty());
    for event in &events {
        assert!(
            event.target.starts_with("cardgrid."),
            "event {:?} has target {}",
            event.message(),
            event.target
        );
    }
}

#[test]
fn significant_state_changes_are_info() {
    let events = session();
    let info: Vec<&str> = events
        .iter()
        .filter(|e| e.level == tracing::Level::INFO)
        .map(CapturedEvent::message)
        .collect();
    for expected in [
        "deck ready",
        "auto-collapse pass",
        "auto-collapse undone",
        "card reordered",
        "layout imported",
    ] {
        assert!(info.contains(&expected), "missing INFO {expected:?} in {info:?}");
    }
}

#[test]
fn collapse_pass_reports_count_and_ceiling() {
    let events = session();
    let pass = events
        .iter()
        .find(|e| e.message() == "auto-collapse pass")
        .unwrap();
    assert_eq!(pass.target, "cardgrid.collapse");
    assert_eq!(pass.fields.get("count").map(String::as_str), Some("2"));
    assert_eq!(pass.fields.get("ceiling").map(String::as_str), Some("2"));

    let per_card = events
        .iter()
        .filter(|e| e.message() == "collapsing card")
        .count();
    assert_eq!(per_card, 2);
    assert!(
        events
            .iter()
            .filter(|e| e.message() == "collapsing card")
            .all(|e| e.level == tracing::Level::DEBUG)
    );
}

#[test]
fn storage_failures_warn_and_never_error() {
    let events = session();
    assert!(events.iter().all(|e| e.level != tracing::Level::ERROR));
    let warnings: Vec<&CapturedEvent> = events
        .iter()
        .filter(|e| e.level == tracing::Level::WARN)
        .collect();
    assert!(
        warnings
            .iter()
            .any(|e| e.target == "cardgrid.persist" && e.fields.contains_key("error"))
    );
    assert!(warnings.iter().any(|e| e.message() == "import rejected"));
}

#[test]
fn events_carry_structured_fields() {
    let events = session();
    for event in events.iter().filter(|e| e.level <= tracing::Level::DEBUG) {
        assert!(
            event.has_structured_fields(),
            "event {:?} at {} has no structured fields",
            event.message(),
            event.level
        );
    }
}
