#![forbid(unsafe_code)]

//! Auto-collapse engine with a single-level undo record.
//!
//! When the space detector reports that cards no longer fit comfortably, the
//! engine lowers the density of non-pinned cards one step at a time until the
//! estimate fits again, a safety ceiling is reached, or candidates run out.
//!
//! # Candidate Order
//!
//! Cards with `priority != pinned`, sorted by `(priority, last_interaction,
//! order)`: normal before high, stalest first, then render order.
//!
//! # Invariants
//!
//! 1. Pinned cards are never touched.
//! 2. At most `ceil(candidates × collapse_percentage / 100)` cards change per pass.
//! 3. Each touched card drops exactly one density step.
//! 4. Engine-driven changes never move `last_interaction`.
//! 5. A pass with the same `(viewport, deck version)` as the last settled one
//!    does nothing.
//!
//! # Undo
//!
//! The latest pass is kept as a [`CollapseRecord`]. Undo restores each
//! recorded card whose density still equals what the engine set; cards the
//! user changed since are left alone. A new pass replaces the record, a
//! successful undo clears it, and it expires after `undo_window_ms`.

use cardgrid_core::{Card, CardId, Density, Timestamp};
use cardgrid_layout::{Footprint, SpaceDetector, SpaceSnapshot, Viewport};
use rustc_hash::FxHashMap;
use tracing::{debug, info};

pub use cardgrid_layout::AutoCollapseSettings;

/// One card changed by a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollapseEntry {
    pub card: CardId,
    pub previous: Density,
    pub applied: Density,
}

/// Undo buffer for the most recent pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollapseRecord {
    entries: Vec<CollapseEntry>,
    created_at: Timestamp,
    expires_at: Timestamp,
}

impl CollapseRecord {
    #[must_use]
    pub fn entries(&self) -> &[CollapseEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    #[must_use]
    pub fn expires_at(&self) -> Timestamp {
        self.expires_at
    }

    #[must_use]
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }

    #[must_use]
    pub fn contains(&self, card: &CardId) -> bool {
        self.entries.iter().any(|e| &e.card == card)
    }
}

/// Result of one pass that changed something.
#[derive(Debug, Clone, PartialEq)]
pub struct CollapseOutcome {
    pub changes: Vec<CollapseEntry>,
    /// Space evaluation after the last change.
    pub space: SpaceSnapshot,
    /// The pass stopped on the safety ceiling while space was still tight.
    pub ceiling_reached: bool,
}

/// Result of an undo.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UndoOutcome {
    pub restored: Vec<CardId>,
    /// Recorded cards whose density had moved since the pass.
    pub skipped: Vec<CardId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SettleKey {
    viewport: Viewport,
    version: u64,
}

/// Decides and applies automatic density reductions.
#[derive(Debug, Clone, Default)]
pub struct AutoCollapseEngine {
    settings: AutoCollapseSettings,
    record: Option<CollapseRecord>,
    settled: Option<SettleKey>,
}

/// `ceil(candidates × percentage / 100)`.
#[must_use]
pub fn collapse_ceiling(candidates: usize, percentage: u8) -> usize {
    let pct = usize::from(percentage.min(100));
    (candidates * pct).div_ceil(100)
}

impl AutoCollapseEngine {
    #[must_use]
    pub fn new(settings: AutoCollapseSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn settings(&self) -> AutoCollapseSettings {
        self.settings
    }

    /// Replace settings. The next evaluation runs even at a settled key.
    pub fn set_settings(&mut self, settings: AutoCollapseSettings) {
        self.settings = AutoCollapseSettings {
            collapse_percentage: settings.collapse_percentage.min(100),
            ..settings
        };
        self.settled = None;
    }

    #[must_use]
    pub fn record(&self) -> Option<&CollapseRecord> {
        self.record.as_ref()
    }

    #[must_use]
    pub fn is_settled(&self, viewport: Viewport, version: u64) -> bool {
        self.settled == Some(SettleKey { viewport, version })
    }

    /// Mark `(viewport, version)` as evaluated.
    pub fn settle(&mut self, viewport: Viewport, version: u64) {
        self.settled = Some(SettleKey { viewport, version });
    }

    /// Run one pass over `cards` in render `order`.
    ///
    /// Returns `None` when disabled, when space is already comfortable, or
    /// when no candidate could be lowered.
    pub fn run(
        &mut self,
        cards: &mut FxHashMap<CardId, Card>,
        order: &[CardId],
        detector: &SpaceDetector,
        viewport: Viewport,
        column_override: Option<u16>,
        now: Timestamp,
    ) -> Option<CollapseOutcome> {
        if !self.settings.enabled {
            return None;
        }

        let live: Vec<&Card> = order.iter().filter_map(|id| cards.get(id)).collect();
        let mut footprints: Vec<Footprint> = live
            .iter()
            .map(|c| Footprint {
                density: c.density,
                size: c.size,
            })
            .collect();
        let mut space = detector.evaluate(viewport, &footprints, column_override);
        if !space.should_auto_collapse {
            return None;
        }

        let mut candidates: Vec<(usize, &Card)> = live
            .into_iter()
            .enumerate()
            .filter(|(_, c)| !c.priority.is_pinned())
            .collect();
        candidates.sort_by_key(|(index, c)| (c.priority, c.last_interaction, *index));
        let ceiling = collapse_ceiling(candidates.len(), self.settings.collapse_percentage);
        let plan: Vec<(usize, CardId)> = candidates
            .into_iter()
            .map(|(index, c)| (index, c.id.clone()))
            .collect();

        let mut changes = Vec::new();
        for (index, id) in plan {
            if changes.len() >= ceiling || !space.should_auto_collapse {
                break;
            }
            let Some(card) = cards.get_mut(&id) else {
                continue;
            };
            let Some(lower) = card.density.step_down() else {
                continue;
            };
            debug!(
                target: "cardgrid.collapse",
                card = %id,
                from = %card.density,
                to = %lower,
                "collapsing card"
            );
            changes.push(CollapseEntry {
                card: id,
                previous: card.density,
                applied: lower,
            });
            card.density = lower;
            footprints[index].density = lower;
            space = detector.evaluate(viewport, &footprints, column_override);
        }

        if changes.is_empty() {
            return None;
        }

        let ceiling_reached = space.should_auto_collapse && changes.len() >= ceiling;
        info!(
            target: "cardgrid.collapse",
            count = changes.len(),
            ceiling,
            ceiling_reached,
            estimated_height = space.estimated_height,
            "auto-collapse pass"
        );
        self.record = Some(CollapseRecord {
            entries: changes.clone(),
            created_at: now,
            expires_at: now.add_millis(self.settings.undo_window_ms),
        });
        Some(CollapseOutcome {
            changes,
            space,
            ceiling_reached,
        })
    }

    /// Restore the last pass. Returns `None` when there is nothing to undo.
    pub fn undo(&mut self, cards: &mut FxHashMap<CardId, Card>) -> Option<UndoOutcome> {
        let record = self.record.take()?;
        let mut outcome = UndoOutcome::default();
        for entry in record.entries {
            match cards.get_mut(&entry.card) {
                Some(card) if card.density == entry.applied => {
                    card.density = entry.previous;
                    outcome.restored.push(entry.card);
                }
                _ => outcome.skipped.push(entry.card),
            }
        }
        info!(
            target: "cardgrid.collapse",
            count = outcome.restored.len(),
            skipped = outcome.skipped.len(),
            "auto-collapse undone"
        );
        Some(outcome)
    }

    /// Drop `card` from the undo record after a manual change.
    ///
    /// Returns `true` if an entry was removed.
    pub fn forget(&mut self, card: &CardId) -> bool {
        let Some(record) = &mut self.record else {
            return false;
        };
        let before = record.entries.len();
        record.entries.retain(|e| &e.card != card);
        let removed = record.entries.len() != before;
        if record.entries.is_empty() {
            self.record = None;
        }
        removed
    }

    /// Clear the record once its window has passed.
    pub fn expire(&mut self, now: Timestamp) -> bool {
        match self.record.take() {
            Some(record) if record.is_expired(now) => {
                debug!(target: "cardgrid.collapse", cards = record.len(), "undo window closed");
                true
            }
            kept => {
                self.record = kept;
                false
            }
        }
    }

    /// Drop the record unconditionally (restore, reset).
    pub fn clear_record(&mut self) -> Option<CollapseRecord> {
        self.record.take()
    }
}
