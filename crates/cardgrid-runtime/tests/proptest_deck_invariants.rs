#![forbid(unsafe_code)]

//! Property tests for the card deck.
//!
//! Validates:
//! - After any operation sequence, `order` fields are a permutation of `0..n`
//!   that matches the render order, and positions match the flow placement.
//! - Auto-collapse never lowers a pinned card and never exceeds its ceiling.
//! - Undo right after a pass restores every density exactly.
//! - Evaluating the same viewport twice without changes is a no-op.
//! - Export then import onto a fresh deck reproduces the arrangement.

use proptest::prelude::*;

use cardgrid_core::{
    Card, CardId, CardKind, CardSize, Density, DensityAction, ManualClock, Priority, Timestamp,
};
use cardgrid_layout::{MAX_COLUMNS, Viewport};
use cardgrid_runtime::{CardDeck, MemoryStorage, collapse_ceiling};

// ============================================================================
// Strategy helpers
// ============================================================================

#[derive(Debug, Clone)]
struct CardSpec {
    density: Density,
    priority: Priority,
    size: CardSize,
}

fn density_strategy() -> impl Strategy<Value = Density> {
    prop_oneof![
        Just(Density::Compact),
        Just(Density::Standard),
        Just(Density::Expanded),
    ]
}

fn priority_strategy() -> impl Strategy<Value = Priority> {
    prop_oneof![
        3 => Just(Priority::Normal),
        1 => Just(Priority::High),
        1 => Just(Priority::Pinned),
    ]
}

fn card_spec_strategy() -> impl Strategy<Value = CardSpec> {
    (density_strategy(), priority_strategy(), 1u16..3, 1u16..3).prop_map(
        |(density, priority, w, h)| CardSpec {
            density,
            priority,
            size: CardSize::new(w, h),
        },
    )
}

fn viewport_strategy() -> impl Strategy<Value = Viewport> {
    (320u32..1600, 400u32..1200).prop_map(|(w, h)| Viewport::new(w, h))
}

#[derive(Debug, Clone)]
enum Op {
    Density { card: usize, action: DensityAction },
    Priority { card: usize, priority: Priority },
    Customize(bool),
    Move { from: usize, to: usize },
    Columns(Option<u16>),
    Evaluate(Viewport),
    Undo,
    Tick(u64),
}

fn action_strategy() -> impl Strategy<Value = DensityAction> {
    prop_oneof![
        Just(DensityAction::Advance),
        Just(DensityAction::CollapseOne),
        Just(DensityAction::Close),
    ]
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0usize..10, action_strategy()).prop_map(|(card, action)| Op::Density { card, action }),
        1 => (0usize..10, priority_strategy()).prop_map(|(card, priority)| Op::Priority { card, priority }),
        1 => any::<bool>().prop_map(Op::Customize),
        2 => (0usize..10, 0usize..10).prop_map(|(from, to)| Op::Move { from, to }),
        1 => prop::option::of(0u16..9).prop_map(Op::Columns),
        2 => viewport_strategy().prop_map(Op::Evaluate),
        1 => Just(Op::Undo),
        1 => (0u64..12_000).prop_map(Op::Tick),
    ]
}

fn build(specs: &[CardSpec], clock: &ManualClock) -> CardDeck<(), MemoryStorage> {
    CardDeck::builder(MemoryStorage::new())
        .clock(clock.clone())
        .cards(specs.iter().enumerate().map(|(i, spec)| {
            let card = Card::new(format!("card-{i}"), CardKind::Ai)
                .with_density(spec.density)
                .with_priority(spec.priority)
                .with_size(spec.size);
            (card, ())
        }))
        .build()
        .unwrap()
}

fn id(i: usize) -> CardId {
    CardId::new(format!("card-{i}"))
}

fn apply(deck: &mut CardDeck<(), MemoryStorage>, clock: &ManualClock, op: &Op) {
    let n = deck.len();
    match *op {
        Op::Density { card, action } => {
            deck.apply_density(&id(card % n), action);
        }
        Op::Priority { card, priority } => {
            deck.set_priority(&id(card % n), priority);
        }
        Op::Customize(on) => {
            deck.set_customizing(on);
        }
        Op::Move { from, to } => {
            deck.move_card(from, to);
        }
        Op::Columns(columns) => {
            deck.set_column_override(columns);
        }
        Op::Evaluate(viewport) => {
            deck.evaluate_space(viewport);
        }
        Op::Undo => {
            deck.undo_auto_collapse();
        }
        Op::Tick(ms) => {
            clock.advance(ms);
            deck.tick();
        }
    }
}

fn clock() -> ManualClock {
    ManualClock::new(Timestamp::from_millis(1_000_000))
}

fn densities(deck: &CardDeck<(), MemoryStorage>) -> Vec<(CardId, Density)> {
    let mut out: Vec<(CardId, Density)> =
        deck.cards().map(|c| (c.id.clone(), c.density)).collect();
    out.sort();
    out
}

// ============================================================================
// Structural invariants
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn order_stays_a_permutation(
        specs in prop::collection::vec(card_spec_strategy(), 1..8),
        ops in prop::collection::vec(op_strategy(), 0..30),
    ) {
        let clock = clock();
        let mut deck = build(&specs, &clock);
        for op in &ops {
            apply(&mut deck, &clock, op);

            let orders: Vec<usize> = deck.cards().map(|c| c.order).collect();
            let expected: Vec<usize> = (0..specs.len()).collect();
            prop_assert_eq!(orders, expected);

            let mut seen: Vec<CardId> = deck.order().to_vec();
            seen.sort();
            seen.dedup();
            prop_assert_eq!(seen.len(), specs.len());

            for placement in deck.placements() {
                let card = deck.card(&placement.card).unwrap();
                prop_assert_eq!(card.position, placement.position);
                prop_assert_eq!(card.order, placement.index);
            }
            if let Some(columns) = deck.column_override() {
                prop_assert!((1..=MAX_COLUMNS).contains(&columns));
            }
        }
    }

    #[test]
    fn pinned_cards_are_never_auto_collapsed(
        specs in prop::collection::vec(card_spec_strategy(), 1..10),
        viewport in viewport_strategy(),
    ) {
        let clock = clock();
        let mut deck = build(&specs, &clock);
        let before = densities(&deck);
        let collapsed = deck.evaluate_space(viewport);

        let candidates = specs.iter().filter(|s| !s.priority.is_pinned()).count();
        let percentage = deck.auto_collapse_settings().collapse_percentage;
        prop_assert!(collapsed <= collapse_ceiling(candidates, percentage));

        for (i, spec) in specs.iter().enumerate() {
            if spec.priority.is_pinned() {
                let card = deck.card(&id(i)).unwrap();
                let original = before.iter().find(|(c, _)| *c == id(i)).unwrap().1;
                prop_assert_eq!(card.density, original);
            }
        }
    }

    #[test]
    fn collapse_lowers_one_step_at_most(
        specs in prop::collection::vec(card_spec_strategy(), 1..10),
        viewport in viewport_strategy(),
    ) {
        let clock = clock();
        let mut deck = build(&specs, &clock);
        let before = densities(&deck);
        deck.evaluate_space(viewport);
        for ((_, was), (_, now)) in before.iter().zip(densities(&deck)) {
            prop_assert!(now == *was || was.step_down() == Some(now));
        }
    }

    #[test]
    fn undo_restores_exactly(
        specs in prop::collection::vec(card_spec_strategy(), 1..10),
        viewport in viewport_strategy(),
    ) {
        let clock = clock();
        let mut deck = build(&specs, &clock);
        let before = densities(&deck);
        let collapsed = deck.evaluate_space(viewport);
        if collapsed > 0 {
            let outcome = deck.undo_auto_collapse().unwrap();
            prop_assert_eq!(outcome.restored.len(), collapsed);
            prop_assert!(outcome.skipped.is_empty());
        }
        prop_assert_eq!(densities(&deck), before);
    }

    #[test]
    fn repeated_evaluation_is_idempotent(
        specs in prop::collection::vec(card_spec_strategy(), 1..10),
        viewport in viewport_strategy(),
    ) {
        let clock = clock();
        let mut deck = build(&specs, &clock);
        deck.evaluate_space(viewport);
        let after_first = densities(&deck);
        let version = deck.version();

        prop_assert_eq!(deck.evaluate_space(viewport), 0);
        prop_assert_eq!(densities(&deck), after_first);
        prop_assert_eq!(deck.version(), version);
    }

    #[test]
    fn export_import_round_trip(
        specs in prop::collection::vec(card_spec_strategy(), 1..8),
        ops in prop::collection::vec(op_strategy(), 0..20),
    ) {
        let clock = clock();
        let mut source = build(&specs, &clock);
        for op in &ops {
            apply(&mut source, &clock, op);
        }
        let file = source.export().unwrap();

        let mut target = build(&specs, &clock);
        let outcome = target.import(&file.contents).unwrap();
        prop_assert_eq!(outcome.restored, specs.len());
        prop_assert!(outcome.ignored.is_empty());

        prop_assert_eq!(target.order(), source.order());
        prop_assert_eq!(target.column_override(), source.column_override());
        prop_assert_eq!(target.auto_collapse_settings(), source.auto_collapse_settings());
        for (a, b) in source.cards().zip(target.cards()) {
            prop_assert_eq!(a.density, b.density);
            prop_assert_eq!(a.priority, b.priority);
        }
    }
}
