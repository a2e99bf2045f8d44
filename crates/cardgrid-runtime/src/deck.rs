#![forbid(unsafe_code)]

//! The card deck: sole owner of the canonical card collection.
//!
//! [`CardDeck`] holds an id-indexed arena of [`Card`]s, the grid manager's
//! order array, the caller's content payloads, and a `version` bumped by
//! every committed mutation. Everything else reads through views.
//!
//! # Mutation Paths
//!
//! | Path | Entry points |
//! |------|--------------|
//! | Density transition | [`CardDeck::apply_density`] |
//! | Reorder commit | [`CardDeck::end_drag`], [`CardDeck::move_card`] |
//! | Auto-collapse pass / undo | [`CardDeck::evaluate_space`], [`CardDeck::tick`], [`CardDeck::undo_auto_collapse`] |
//! | Snapshot restore | build-time load, [`CardDeck::import`], [`CardDeck::reset`] |
//!
//! Priority, column override, and auto-collapse settings are plain setters
//! that commit the same way.
//!
//! # Timing
//!
//! Nothing runs in the background. Resizes and saves are debounced against
//! the injected [`Clock`]; the host calls [`CardDeck::tick`] from its event
//! loop and due work runs there in a fixed order: resize evaluation, undo
//! expiry, save.
//!
//! # Invariants
//!
//! 1. After every public call, card `order` fields are `0..n` and match the
//!    order array.
//! 2. Card `position` always reflects the flow placement at the current
//!    column count.
//! 3. Every committed mutation schedules a save, except `reset`, which
//!    clears storage instead.

use cardgrid_core::{
    Card, CardContent, CardId, CardSize, Clock, DensityAction, DensityChange, InteractionMode, Priority,
    SystemClock, Timestamp,
};
use cardgrid_layout::{
    AutoCollapseSettings, DragRejected, DragSession, Footprint, GridLayoutManager, LayoutSnapshot,
    Placement, Reorder, RestoreOutcome, SpaceDetector, SpaceSnapshot, Viewport,
};
use chrono::{DateTime, Utc};
use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::collapse::{AutoCollapseEngine, CollapseRecord, UndoOutcome};
use crate::config::DeckConfig;
use crate::debounce::{Debouncer, DeferredHandle};
use crate::notice::{Notice, NoticeAction, NoticeKind, NoticeQueue};
use crate::persistence::{
    ExportFile, ImportError, LayoutPersistence, LoadOutcome, SaveStatus, export_file,
    import_snapshot,
};
use crate::storage::{MemoryStorage, StorageBackend};

/// Errors building a deck.
#[derive(Debug, Error)]
pub enum DeckError {
    #[error("card {0} appears more than once in the default layout")]
    DuplicateCard(CardId),
    #[error("default layout contains a card with an empty id")]
    EmptyCardId,
    #[error("invalid configuration: {}", .0.join("; "))]
    InvalidConfig(Vec<String>),
}

/// One card as a renderer sees it.
#[derive(Debug)]
pub struct CardView<'a, C> {
    pub card: &'a Card,
    pub content: &'a C,
    pub placement: Placement,
}

/// What a [`CardDeck::tick`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// A debounced resize was evaluated.
    pub evaluated: bool,
    /// Cards collapsed by that evaluation.
    pub collapsed: usize,
    pub undo_expired: bool,
    /// A debounced save was attempted and succeeded.
    pub saved: bool,
}

// =========================================================================
// Builder
// =========================================================================

/// Collects the default layout and collaborators for a [`CardDeck`].
pub struct DeckBuilder<C, S> {
    storage: S,
    config: DeckConfig,
    clock: Box<dyn Clock>,
    cards: Vec<(Card, C)>,
}

impl<C, S: StorageBackend> DeckBuilder<C, S> {
    #[must_use]
    pub fn config(mut self, config: DeckConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Append a card to the default layout. Order follows insertion.
    #[must_use]
    pub fn card(mut self, card: Card, content: C) -> Self {
        self.cards.push((card, content));
        self
    }

    #[must_use]
    pub fn cards(mut self, cards: impl IntoIterator<Item = (Card, C)>) -> Self {
        self.cards.extend(cards);
        self
    }

    /// Validate, then restore any stored layout on top of the defaults.
    pub fn build(self) -> Result<CardDeck<C, S>, DeckError> {
        let problems = self.config.validate();
        if !problems.is_empty() {
            return Err(DeckError::InvalidConfig(problems));
        }

        let mut seen = FxHashSet::default();
        for (card, _) in &self.cards {
            if card.id.is_empty() {
                return Err(DeckError::EmptyCardId);
            }
            if !seen.insert(card.id.clone()) {
                return Err(DeckError::DuplicateCard(card.id.clone()));
            }
        }

        let mut defaults = Vec::with_capacity(self.cards.len());
        let mut contents = FxHashMap::default();
        for (index, (card, content)) in self.cards.into_iter().enumerate() {
            contents.insert(card.id.clone(), content);
            defaults.push(card.with_order(index));
        }
        let order: Vec<CardId> = defaults.iter().map(|c| c.id.clone()).collect();
        let cards = defaults.iter().map(|c| (c.id.clone(), c.clone())).collect();

        let config = self.config;
        let mut deck = CardDeck {
            cards,
            contents,
            grid: GridLayoutManager::new(order),
            defaults,
            detector: config.detector(),
            collapse: AutoCollapseEngine::new(config.auto_collapse),
            persistence: LayoutPersistence::new(self.storage, &config.persistence),
            notices: NoticeQueue::new(config.notices),
            resize: Debouncer::new(config.resize_debounce_ms),
            clock: self.clock,
            config,
            viewport: None,
            pending_viewport: None,
            space: None,
            version: 0,
        };
        deck.restore_stored();
        deck.reflow();
        info!(
            target: "cardgrid.deck",
            cards = deck.len(),
            backend = deck.persistence.backend().name(),
            "deck ready"
        );
        Ok(deck)
    }
}

// =========================================================================
// CardDeck
// =========================================================================

/// Canonical card collection plus the engines that act on it.
pub struct CardDeck<C = CardContent, S = MemoryStorage> {
    cards: FxHashMap<CardId, Card>,
    contents: FxHashMap<CardId, C>,
    grid: GridLayoutManager,
    /// Default layout, in default order, for `reset`.
    defaults: Vec<Card>,
    detector: SpaceDetector,
    collapse: AutoCollapseEngine,
    persistence: LayoutPersistence<S>,
    notices: NoticeQueue,
    resize: Debouncer,
    clock: Box<dyn Clock>,
    config: DeckConfig,
    viewport: Option<Viewport>,
    pending_viewport: Option<Viewport>,
    space: Option<SpaceSnapshot>,
    version: u64,
}

impl<C, S: StorageBackend> CardDeck<C, S> {
    /// Start building a deck that persists to `storage`.
    #[must_use]
    pub fn builder(storage: S) -> DeckBuilder<C, S> {
        DeckBuilder {
            storage,
            config: DeckConfig::default(),
            clock: Box::new(SystemClock),
            cards: Vec::new(),
        }
    }

    // ====================================================================
    // Read-only views
    // ====================================================================

    /// Cards in render order.
    pub fn cards(&self) -> impl Iterator<Item = &Card> + '_ {
        self.grid.order().iter().filter_map(|id| self.cards.get(id))
    }

    #[must_use]
    pub fn card(&self, id: &CardId) -> Option<&Card> {
        self.cards.get(id)
    }

    #[must_use]
    pub fn content(&self, id: &CardId) -> Option<&C> {
        self.contents.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.grid.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }

    #[must_use]
    pub fn order(&self) -> &[CardId] {
        self.grid.order()
    }

    /// Order including an uncommitted drag preview.
    #[must_use]
    pub fn preview_order(&self) -> Vec<CardId> {
        self.grid.preview_order()
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[must_use]
    pub fn config(&self) -> &DeckConfig {
        &self.config
    }

    #[must_use]
    pub fn space(&self) -> Option<&SpaceSnapshot> {
        self.space.as_ref()
    }

    #[must_use]
    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    #[must_use]
    pub fn mode(&self) -> InteractionMode {
        self.grid.mode()
    }

    #[must_use]
    pub fn drag(&self) -> Option<&DragSession> {
        self.grid.drag()
    }

    #[must_use]
    pub fn column_override(&self) -> Option<u16> {
        self.grid.column_override()
    }

    /// Columns in effect right now.
    #[must_use]
    pub fn grid_columns(&self) -> u16 {
        let width = self.viewport.map_or(0, |v| v.width);
        self.detector.columns_for(width, self.grid.column_override())
    }

    #[must_use]
    pub fn auto_collapse_settings(&self) -> AutoCollapseSettings {
        self.collapse.settings()
    }

    #[must_use]
    pub fn collapse_record(&self) -> Option<&CollapseRecord> {
        self.collapse.record()
    }

    #[must_use]
    pub fn placements(&self) -> Vec<Placement> {
        self.grid.placements(self.grid_columns(), |id| {
            self.cards.get(id).map_or(CardSize::UNIT, |c| c.size)
        })
    }

    /// Card, content, and placement per card in render order.
    #[must_use]
    pub fn view(&self) -> Vec<CardView<'_, C>> {
        self.placements()
            .into_iter()
            .filter_map(|placement| {
                let card = self.cards.get(&placement.card)?;
                let content = self.contents.get(&placement.card)?;
                Some(CardView {
                    card,
                    content,
                    placement,
                })
            })
            .collect()
    }

    /// The current arrangement as it would be saved.
    #[must_use]
    pub fn snapshot(&self) -> LayoutSnapshot {
        self.snapshot_at(self.clock.now())
    }

    #[must_use]
    pub fn storage(&self) -> &S {
        self.persistence.backend()
    }

    #[must_use]
    pub fn notices(&self) -> &NoticeQueue {
        &self.notices
    }

    /// Take every pending notice, most severe first.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain()
    }

    #[must_use]
    pub fn resize_pending(&self) -> bool {
        self.resize.is_pending()
    }

    #[must_use]
    pub fn save_pending(&self) -> bool {
        self.persistence.save_pending()
    }

    /// Successful writes since the deck was built.
    #[must_use]
    pub fn save_count(&self) -> u64 {
        self.persistence.save_count()
    }

    // ====================================================================
    // Density and priority
    // ====================================================================

    /// Apply a user density action to one card.
    ///
    /// No-op (returns `None`) for unknown cards, end-of-chain actions, and
    /// while customizing.
    pub fn apply_density(&mut self, id: &CardId, action: DensityAction) -> Option<DensityChange> {
        let now = self.clock.now();
        let mode = self.grid.mode();
        let change = self.cards.get_mut(id)?.apply(action, mode, now)?;
        if self.collapse.forget(id) {
            debug!(target: "cardgrid.collapse", card = %id, "manual change drops undo entry");
        }
        debug!(
            target: "cardgrid.density",
            card = %id,
            from = %change.from,
            to = %change.to,
            "density changed"
        );
        self.commit(now, true);
        Some(change)
    }

    /// Set a card's priority. Allowed in either mode.
    pub fn set_priority(&mut self, id: &CardId, priority: Priority) -> bool {
        let Some(card) = self.cards.get_mut(id) else {
            return false;
        };
        if card.priority == priority {
            return false;
        }
        card.priority = priority;
        debug!(target: "cardgrid.deck", card = %id, priority = %priority, "priority changed");
        let now = self.clock.now();
        self.commit(now, true);
        true
    }

    // ====================================================================
    // Customization and reordering
    // ====================================================================

    /// Enter or leave customization mode. Returns a drag cancelled by leaving.
    pub fn set_customizing(&mut self, customizing: bool) -> Option<DragSession> {
        let mode = if customizing {
            InteractionMode::Customize
        } else {
            InteractionMode::Display
        };
        let cancelled = self.grid.set_mode(mode);
        if let Some(drag) = &cancelled {
            debug!(target: "cardgrid.grid", card = %drag.card, "drag cancelled by mode change");
        }
        cancelled
    }

    pub fn begin_drag(&mut self, id: &CardId) -> Result<&DragSession, DragRejected> {
        let session = self.grid.begin_drag(id)?;
        debug!(target: "cardgrid.grid", card = %id, origin = session.origin, "drag started");
        Ok(session)
    }

    /// Move the drop target. Intermediate frames are never saved.
    pub fn drag_over(&mut self, target: usize) -> Option<usize> {
        self.grid.drag_over(target)
    }

    /// Commit the active drag.
    pub fn end_drag(&mut self) -> Option<Reorder> {
        let reorder = self.grid.end_drag()?;
        self.finish_reorder(&reorder);
        Some(reorder)
    }

    pub fn cancel_drag(&mut self) -> Option<DragSession> {
        self.grid.cancel_drag()
    }

    /// Reorder without a gesture (keyboard). Customization mode only, and
    /// never while a drag is in flight.
    pub fn move_card(&mut self, from: usize, to: usize) -> Option<Reorder> {
        if self.grid.mode() != InteractionMode::Customize {
            return None;
        }
        let reorder = self.grid.move_card(from, to)?;
        self.finish_reorder(&reorder);
        Some(reorder)
    }

    fn finish_reorder(&mut self, reorder: &Reorder) {
        let now = self.clock.now();
        if let Some(card) = self.cards.get_mut(&reorder.card) {
            card.touch(now);
        }
        info!(
            target: "cardgrid.grid",
            card = %reorder.card,
            from = reorder.from,
            to = reorder.to,
            "card reordered"
        );
        self.commit(now, true);
    }

    /// Set or clear the manual column count. Returns `true` if it changed.
    pub fn set_column_override(&mut self, columns: Option<u16>) -> bool {
        if !self.grid.set_column_override(columns) {
            return false;
        }
        debug!(target: "cardgrid.grid", columns = ?self.grid.column_override(), "column override changed");
        let now = self.clock.now();
        self.commit(now, true);
        true
    }

    // ====================================================================
    // Space and auto-collapse
    // ====================================================================

    /// Replace auto-collapse settings. Returns `true` if they changed.
    pub fn set_auto_collapse(&mut self, settings: AutoCollapseSettings) -> bool {
        if self.collapse.settings() == settings {
            return false;
        }
        self.collapse.set_settings(settings);
        info!(
            target: "cardgrid.collapse",
            enabled = settings.enabled,
            collapse_percentage = settings.collapse_percentage,
            "auto-collapse settings changed"
        );
        let now = self.clock.now();
        self.commit(now, true);
        true
    }

    /// Record a new viewport; evaluation runs on `tick` after the quiet period.
    pub fn resize(&mut self, viewport: Viewport) -> DeferredHandle {
        self.pending_viewport = Some(viewport);
        self.resize.schedule(self.clock.now())
    }

    /// Evaluate `viewport` now, cancelling any pending resize.
    ///
    /// Returns how many cards were auto-collapsed.
    pub fn evaluate_space(&mut self, viewport: Viewport) -> usize {
        self.resize.cancel();
        self.pending_viewport = None;
        self.viewport = Some(viewport);
        self.reflow();
        let now = self.clock.now();
        self.run_space_pass(now)
    }

    /// Undo the last auto-collapse pass.
    pub fn undo_auto_collapse(&mut self) -> Option<UndoOutcome> {
        let outcome = self.collapse.undo(&mut self.cards)?;
        if !outcome.restored.is_empty() {
            let now = self.clock.now();
            self.commit(now, true);
        }
        // The user chose this state; do not collapse it again at this size.
        if let Some(viewport) = self.viewport {
            self.collapse.settle(viewport, self.version);
        }
        Some(outcome)
    }

    /// Run a notice's attached action.
    pub fn invoke(&mut self, action: NoticeAction) -> bool {
        match action {
            NoticeAction::UndoAutoCollapse => self.undo_auto_collapse().is_some(),
        }
    }

    fn run_space_pass(&mut self, now: Timestamp) -> usize {
        let Some(viewport) = self.viewport else {
            return 0;
        };
        if self.collapse.is_settled(viewport, self.version) {
            self.refresh_space();
            return 0;
        }

        let outcome = self.collapse.run(
            &mut self.cards,
            self.grid.order(),
            &self.detector,
            viewport,
            self.grid.column_override(),
            now,
        );
        let count = outcome.map_or(0, |o| o.changes.len());
        if count > 0 {
            self.commit(now, true);
            self.notices.push(NoticeKind::AutoCollapsed { count }, now);
        } else {
            self.refresh_space();
        }
        self.collapse.settle(viewport, self.version);
        count
    }

    // ====================================================================
    // Persistence
    // ====================================================================

    /// Apply an exported layout. Invalid input changes nothing.
    pub fn import(&mut self, text: &str) -> Result<RestoreOutcome, ImportError> {
        let now = self.clock.now();
        let snapshot = match import_snapshot(text) {
            Ok(snapshot) => snapshot,
            Err(error) => {
                warn!(target: "cardgrid.persist", error = %error, "import rejected");
                self.notices.push(
                    NoticeKind::ImportFailed {
                        reason: error.reason(),
                    },
                    now,
                );
                return Err(error);
            }
        };
        let outcome = self.apply_snapshot(&snapshot);
        self.commit(now, true);
        self.notices.push(NoticeKind::LayoutImported, now);
        info!(
            target: "cardgrid.persist",
            restored = outcome.restored,
            ignored = outcome.ignored.len(),
            "layout imported"
        );
        Ok(outcome)
    }

    /// Serialize the current layout as a downloadable file.
    pub fn export(&self) -> serde_json::Result<ExportFile> {
        export_file(&self.snapshot())
    }

    /// Return every card to the default layout and clear stored state.
    pub fn reset(&mut self) {
        let now = self.clock.now();
        self.cards = self
            .defaults
            .iter()
            .map(|c| (c.id.clone(), c.clone()))
            .collect();
        self.grid
            .replace_order(self.defaults.iter().map(|c| c.id.clone()).collect());
        self.grid.set_column_override(None);
        self.collapse.set_settings(self.config.auto_collapse);
        self.collapse.clear_record();
        if let Err(error) = self.persistence.clear() {
            warn!(target: "cardgrid.persist", error = %error, "could not clear stored layout");
            self.notices.push(
                NoticeKind::PersistenceUnavailable {
                    reason: error.to_string(),
                },
                now,
            );
        }
        self.commit(now, false);
        self.notices.push(NoticeKind::LayoutReset, now);
        info!(target: "cardgrid.deck", cards = self.len(), "layout reset");
    }

    /// Run due deferred work: resize evaluation, undo expiry, save.
    pub fn tick(&mut self) -> TickReport {
        let now = self.clock.now();
        let mut report = TickReport::default();

        if self.resize.poll(now) {
            if let Some(viewport) = self.pending_viewport.take() {
                self.viewport = Some(viewport);
                self.reflow();
                report.evaluated = true;
                report.collapsed = self.run_space_pass(now);
            }
        }

        report.undo_expired = self.collapse.expire(now);

        if self.persistence.poll_save(now) {
            report.saved = self.save_now(now);
        }
        report
    }

    /// Write a pending save immediately. Returns `true` if a save succeeded.
    pub fn flush(&mut self) -> bool {
        if !self.persistence.cancel_save() {
            return false;
        }
        let now = self.clock.now();
        self.save_now(now)
    }

    fn save_now(&mut self, now: Timestamp) -> bool {
        let snapshot = self.snapshot_at(now);
        match self.persistence.save(&snapshot) {
            SaveStatus::Saved => true,
            SaveStatus::Failed { error, report } => {
                if report {
                    self.notices.push(
                        NoticeKind::PersistenceUnavailable {
                            reason: error.to_string(),
                        },
                        now,
                    );
                }
                false
            }
        }
    }

    fn restore_stored(&mut self) {
        let now = self.clock.now();
        match self.persistence.load() {
            LoadOutcome::Missing | LoadOutcome::Corrupt(_) => {}
            LoadOutcome::Loaded(snapshot) => {
                let outcome = self.apply_snapshot(&snapshot);
                self.version += 1;
                self.notices.push(NoticeKind::LayoutRestored, now);
                debug!(
                    target: "cardgrid.persist",
                    restored = outcome.restored,
                    ignored = outcome.ignored.len(),
                    "stored layout applied"
                );
            }
            LoadOutcome::Unavailable(error) => {
                self.notices.push(
                    NoticeKind::PersistenceUnavailable {
                        reason: error.to_string(),
                    },
                    now,
                );
            }
        }
    }

    fn apply_snapshot(&mut self, snapshot: &LayoutSnapshot) -> RestoreOutcome {
        let outcome = snapshot.restore_onto(&mut self.cards, self.grid.order());
        self.grid.replace_order(outcome.order.clone());
        self.grid.set_column_override(snapshot.grid_columns);
        self.collapse.set_settings(snapshot.auto_collapse_settings);
        self.collapse.clear_record();
        outcome
    }

    fn snapshot_at(&self, now: Timestamp) -> LayoutSnapshot {
        LayoutSnapshot::capture(
            self.cards(),
            self.grid.column_override(),
            self.collapse.settings(),
            saved_at(now),
        )
    }

    // ====================================================================
    // Commit plumbing
    // ====================================================================

    fn commit(&mut self, now: Timestamp, save: bool) {
        self.version += 1;
        self.reflow();
        self.refresh_space();
        if save {
            self.persistence.schedule_save(now);
        }
    }

    /// Relabel `order` and write flow positions back into cards.
    fn reflow(&mut self) {
        let placements = self.placements();
        for placement in placements {
            if let Some(card) = self.cards.get_mut(&placement.card) {
                card.order = placement.index;
                card.position = placement.position;
            }
        }
    }

    fn refresh_space(&mut self) {
        if let Some(viewport) = self.viewport {
            let footprints: Vec<Footprint> = self
                .cards()
                .map(|c| Footprint {
                    density: c.density,
                    size: c.size,
                })
                .collect();
            self.space = Some(self.detector.evaluate(
                viewport,
                &footprints,
                self.grid.column_override(),
            ));
        }
    }
}

fn saved_at(now: Timestamp) -> DateTime<Utc> {
    let millis = i64::try_from(now.as_millis()).unwrap_or(i64::MAX);
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}
