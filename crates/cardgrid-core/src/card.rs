#![forbid(unsafe_code)]

//! Card entity model.
//!
//! A [`Card`] carries everything the engine needs to lay out and adapt one
//! card: its identity, current [`Density`], advisory grid placement,
//! footprint, [`Priority`], order index, and the time of the last user
//! interaction. Content lives elsewhere (see [`crate::content`]).
//!
//! # Invariants
//!
//! 1. A card always holds exactly one density.
//! 2. `last_interaction` only moves on user-driven changes; engine-driven
//!    density changes leave it untouched.
//! 3. `kind` is an opaque styling discriminator. Engine logic never branches
//!    on it.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::clock::Timestamp;
use crate::density::{Density, DensityAction, DensityChange, InteractionMode, transition};

/// Stable card identifier supplied by the host's default layout.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(String);

impl CardId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CardId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for CardId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for CardId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Semantic category used by renderers for styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardKind {
    #[default]
    Institutional,
    Creator,
    Personal,
    Ai,
}

/// How the auto-collapse engine treats a card.
///
/// Ordered by protection: `Normal < High < Pinned`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// First in line for auto-collapse.
    #[default]
    Normal,
    /// Collapsed only after every normal card.
    High,
    /// Never auto-collapsed.
    Pinned,
}

impl Priority {
    #[must_use]
    pub const fn is_pinned(self) -> bool {
        matches!(self, Self::Pinned)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Normal => "normal",
            Self::High => "high",
            Self::Pinned => "pinned",
        })
    }
}

/// Last known grid cell of a card's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridPosition {
    pub row: u16,
    pub col: u16,
}

impl GridPosition {
    #[must_use]
    pub const fn new(row: u16, col: u16) -> Self {
        Self { row, col }
    }
}

/// Footprint of a card in grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardSize {
    pub width: u16,
    pub height: u16,
}

impl CardSize {
    pub const UNIT: CardSize = CardSize {
        width: 1,
        height: 1,
    };

    /// Create a size. Zero dimensions are raised to one cell.
    #[must_use]
    pub const fn new(width: u16, height: u16) -> Self {
        Self {
            width: if width == 0 { 1 } else { width },
            height: if height == 0 { 1 } else { height },
        }
    }
}

impl Default for CardSize {
    fn default() -> Self {
        Self::UNIT
    }
}

/// One card in the deck.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub id: CardId,
    pub kind: CardKind,
    pub density: Density,
    /// Advisory; the order index is authoritative for placement.
    pub position: GridPosition,
    pub size: CardSize,
    pub priority: Priority,
    pub order: usize,
    pub last_interaction: Timestamp,
}

impl Card {
    /// A standard-density, normal-priority, 1x1 card.
    #[must_use]
    pub fn new(id: impl Into<CardId>, kind: CardKind) -> Self {
        Self {
            id: id.into(),
            kind,
            density: Density::Standard,
            position: GridPosition::default(),
            size: CardSize::UNIT,
            priority: Priority::Normal,
            order: 0,
            last_interaction: Timestamp::ZERO,
        }
    }

    #[must_use]
    pub fn with_density(mut self, density: Density) -> Self {
        self.density = density;
        self
    }

    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn with_size(mut self, size: CardSize) -> Self {
        self.size = size;
        self
    }

    #[must_use]
    pub fn with_order(mut self, order: usize) -> Self {
        self.order = order;
        self
    }

    /// Apply a user density action.
    ///
    /// Returns `None` when the action is a no-op (end of the chain, or the
    /// grid is in customization mode). On a real change, `last_interaction`
    /// is set to `now`.
    pub fn apply(
        &mut self,
        action: DensityAction,
        mode: InteractionMode,
        now: Timestamp,
    ) -> Option<DensityChange> {
        if !mode.accepts_density_actions() {
            return None;
        }
        let from = self.density;
        let to = transition(from, action);
        if from == to {
            return None;
        }
        self.density = to;
        self.last_interaction = now;
        Some(DensityChange { from, to })
    }

    /// Record a user interaction that is not a density change (e.g. a reorder).
    pub fn touch(&mut self, now: Timestamp) {
        self.last_interaction = now;
    }
}
