#![forbid(unsafe_code)]

//! Persisted layout snapshot, schema v1, with validation and migration.
//!
//! A [`LayoutSnapshot`] is the single unit written to durable storage and to
//! export files. It captures card order, density, and priority together with
//! the column preference and auto-collapse settings.
//!
//! # Wire Format
//!
//! ```json
//! {
//!   "version": 1,
//!   "cards": [
//!     { "id": "institutional", "order": 0, "density": "standard", "priority": "pinned" },
//!     { "id": "creator", "order": 1, "density": "compact", "priority": "normal" }
//!   ],
//!   "gridColumns": null,
//!   "autoCollapseSettings": { "enabled": true, "collapsePercentage": 40, "undoWindowMs": 10000 },
//!   "savedAt": "2026-10-18T09:30:00Z"
//! }
//! ```
//!
//! `gridColumns: null` means the column count follows the space detector.
//!
//! # Schema Versioning Policy
//!
//! - Additive optional fields may be introduced without a version bump.
//! - Anything else increments [`LAYOUT_SCHEMA_VERSION`] and adds a migration
//!   arm to [`migrate_snapshot`].
//!
//! # Restore Semantics
//!
//! Restoring onto a live card set touches only cards whose id appears in both.
//! Snapshot entries for unknown ids are ignored; live cards missing from the
//! snapshot keep their density and priority and are slotted in at their
//! current index. The resulting order is relabelled to `0..n`.

use std::fmt;

use cardgrid_core::{Card, CardId, Density, Priority};
use chrono::{DateTime, Utc};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::space::MAX_COLUMNS;

/// Current layout schema version.
pub const LAYOUT_SCHEMA_VERSION: u16 = 1;

fn default_layout_version() -> u16 {
    LAYOUT_SCHEMA_VERSION
}

// =========================================================================
// Schema types
// =========================================================================

/// Auto-collapse configuration, persisted with the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoCollapseSettings {
    pub enabled: bool,
    /// Safety ceiling: at most this share of candidates is touched per pass.
    #[serde(alias = "collapse_percentage")]
    pub collapse_percentage: u8,
    /// How long the undo record stays valid after a pass.
    #[serde(default = "default_undo_window_ms", alias = "undo_window_ms")]
    pub undo_window_ms: u64,
}

fn default_undo_window_ms() -> u64 {
    10_000
}

impl Default for AutoCollapseSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            collapse_percentage: 40,
            undo_window_ms: default_undo_window_ms(),
        }
    }
}

/// One card's persisted state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRecord {
    pub id: CardId,
    pub order: usize,
    pub density: Density,
    pub priority: Priority,
}

impl CardRecord {
    #[must_use]
    pub fn of(card: &Card) -> Self {
        Self {
            id: card.id.clone(),
            order: card.order,
            density: card.density,
            priority: card.priority,
        }
    }
}

/// The persisted and exported arrangement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSnapshot {
    #[serde(default = "default_layout_version")]
    pub version: u16,
    pub cards: Vec<CardRecord>,
    #[serde(default)]
    pub grid_columns: Option<u16>,
    pub auto_collapse_settings: AutoCollapseSettings,
    pub saved_at: DateTime<Utc>,
}

impl LayoutSnapshot {
    /// Capture a snapshot from cards given in render order.
    ///
    /// Card `order` fields are taken from their position in the iterator.
    pub fn capture<'a>(
        cards: impl IntoIterator<Item = &'a Card>,
        grid_columns: Option<u16>,
        auto_collapse_settings: AutoCollapseSettings,
        saved_at: DateTime<Utc>,
    ) -> Self {
        let cards = cards
            .into_iter()
            .enumerate()
            .map(|(order, card)| CardRecord {
                order,
                ..CardRecord::of(card)
            })
            .collect();
        Self {
            version: LAYOUT_SCHEMA_VERSION,
            cards,
            grid_columns,
            auto_collapse_settings,
            saved_at,
        }
    }

    /// Check schema version and structural invariants.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.version != LAYOUT_SCHEMA_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: self.version,
                expected: LAYOUT_SCHEMA_VERSION,
            });
        }

        let mut seen = FxHashSet::default();
        for (index, record) in self.cards.iter().enumerate() {
            if record.id.is_empty() {
                return Err(SnapshotError::EmptyCardId { index });
            }
            if !seen.insert(&record.id) {
                return Err(SnapshotError::DuplicateCard {
                    id: record.id.clone(),
                });
            }
        }

        let mut orders: Vec<usize> = self.cards.iter().map(|c| c.order).collect();
        orders.sort_unstable();
        if let Some((expected, &found)) = orders
            .iter()
            .enumerate()
            .find(|(expected, found)| *expected != **found)
        {
            return Err(SnapshotError::NonContiguousOrder { expected, found });
        }

        if let Some(cols) = self.grid_columns
            && !(1..=MAX_COLUMNS).contains(&cols)
        {
            return Err(SnapshotError::InvalidColumns { columns: cols });
        }

        if self.auto_collapse_settings.collapse_percentage > 100 {
            return Err(SnapshotError::InvalidCollapsePercentage {
                value: self.auto_collapse_settings.collapse_percentage,
            });
        }

        Ok(())
    }

    /// Sort card records by order for deterministic output.
    pub fn canonicalize(&mut self) {
        self.cards.sort_by(|a, b| a.order.cmp(&b.order).then(a.id.cmp(&b.id)));
    }

    #[must_use]
    pub fn record(&self, id: &CardId) -> Option<&CardRecord> {
        self.cards.iter().find(|c| &c.id == id)
    }

    /// Apply this snapshot onto live cards.
    ///
    /// `current_order` is the live render order; every id in it must be a key
    /// of `cards`. Writes density, priority, and relabelled `order` into the
    /// arena and returns the new render order.
    pub fn restore_onto(
        &self,
        cards: &mut FxHashMap<CardId, Card>,
        current_order: &[CardId],
    ) -> RestoreOutcome {
        let records: FxHashMap<&CardId, &CardRecord> =
            self.cards.iter().map(|r| (&r.id, r)).collect();

        // Snapshot cards sort by their saved order; the rest hold their slot.
        let mut keyed: Vec<((usize, u8, usize), CardId)> = current_order
            .iter()
            .enumerate()
            .map(|(index, id)| {
                let key = match records.get(id) {
                    Some(rec) => (rec.order, 0, index),
                    None => (index, 1, index),
                };
                (key, id.clone())
            })
            .collect();
        keyed.sort_by(|a, b| a.0.cmp(&b.0));
        let order: Vec<CardId> = keyed.into_iter().map(|(_, id)| id).collect();

        let mut restored = 0;
        for (index, id) in order.iter().enumerate() {
            if let Some(card) = cards.get_mut(id) {
                card.order = index;
                if let Some(rec) = records.get(id) {
                    card.density = rec.density;
                    card.priority = rec.priority;
                    restored += 1;
                }
            }
        }

        let live: FxHashSet<&CardId> = current_order.iter().collect();
        let ignored = self
            .cards
            .iter()
            .filter(|r| !live.contains(&r.id))
            .map(|r| r.id.clone())
            .collect();

        RestoreOutcome {
            order,
            restored,
            ignored,
        }
    }
}

/// Result of [`LayoutSnapshot::restore_onto`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreOutcome {
    /// New render order.
    pub order: Vec<CardId>,
    /// Number of live cards that took values from the snapshot.
    pub restored: usize,
    /// Snapshot ids with no live card.
    pub ignored: Vec<CardId>,
}

// =========================================================================
// Validation errors
// =========================================================================

/// Structural problems found in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    UnsupportedVersion { found: u16, expected: u16 },
    EmptyCardId { index: usize },
    DuplicateCard { id: CardId },
    /// Sorted order values must be exactly `0..n`.
    NonContiguousOrder { expected: usize, found: usize },
    InvalidColumns { columns: u16 },
    InvalidCollapsePercentage { value: u8 },
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedVersion { found, expected } => {
                write!(
                    f,
                    "unsupported layout schema version {found} (expected {expected})"
                )
            }
            Self::EmptyCardId { index } => write!(f, "card entry {index} has an empty id"),
            Self::DuplicateCard { id } => write!(f, "card {id} appears more than once"),
            Self::NonContiguousOrder { expected, found } => write!(
                f,
                "card order is not contiguous: expected {expected}, found {found}"
            ),
            Self::InvalidColumns { columns } => {
                write!(f, "grid columns {columns} outside 1..={MAX_COLUMNS}")
            }
            Self::InvalidCollapsePercentage { value } => {
                write!(f, "collapse percentage {value} exceeds 100")
            }
        }
    }
}

impl std::error::Error for SnapshotError {}

// =========================================================================
// Migration scaffolding
// =========================================================================

/// Errors from snapshot migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotMigrationError {
    /// Written by a newer schema than this build understands.
    UnsupportedVersion { version: u16 },
    /// Older schema with no migration arm.
    NoMigrationPath { from: u16, to: u16 },
}

impl fmt::Display for SnapshotMigrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedVersion { version } => {
                write!(f, "layout schema version {version} is newer than supported")
            }
            Self::NoMigrationPath { from, to } => {
                write!(f, "no migration path from v{from} to v{to}")
            }
        }
    }
}

impl std::error::Error for SnapshotMigrationError {}

/// Bring a snapshot up to [`LAYOUT_SCHEMA_VERSION`]. v1 is the identity.
pub fn migrate_snapshot(
    snapshot: LayoutSnapshot,
) -> Result<LayoutSnapshot, SnapshotMigrationError> {
    match snapshot.version {
        LAYOUT_SCHEMA_VERSION => Ok(snapshot),
        v if v > LAYOUT_SCHEMA_VERSION => {
            Err(SnapshotMigrationError::UnsupportedVersion { version: v })
        }
        v => Err(SnapshotMigrationError::NoMigrationPath {
            from: v,
            to: LAYOUT_SCHEMA_VERSION,
        }),
    }
}

// =========================================================================
// Tests
// =========================================================================
