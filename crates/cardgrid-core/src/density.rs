#![forbid(unsafe_code)]

//! Per-card density state machine.
//!
//! A card is always in exactly one of three densities:
//!
//! ```text
//!            advance            advance
//!  Compact ──────────► Standard ──────────► Expanded
//!          ◄──────────          ◄──────────
//!        collapse / close     collapse / close
//! ```
//!
//! # Invariants
//!
//! 1. Every action moves at most one step; `Compact` and `Expanded` are never
//!    adjacent.
//! 2. `Advance` on `Expanded` is a no-op. Leaving `Expanded` requires an
//!    explicit `Close` (or `CollapseOne`), never a second tap.
//! 3. `CollapseOne`/`Close` on `Compact` is a no-op.
//! 4. [`transition`] is pure: the result depends only on `(density, action)`.
//!
//! # Failure Modes
//!
//! None. There are no invalid inputs, only no-op inputs.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Display density of a card.
///
/// Ordered from least to most detail so `Compact < Standard < Expanded`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Density {
    Compact,
    #[default]
    Standard,
    Expanded,
}

impl Density {
    /// All densities in ascending order of detail.
    pub const ALL: [Density; 3] = [Density::Compact, Density::Standard, Density::Expanded];

    /// The next denser state, or `None` when already expanded.
    #[must_use]
    pub const fn step_up(self) -> Option<Self> {
        match self {
            Self::Compact => Some(Self::Standard),
            Self::Standard => Some(Self::Expanded),
            Self::Expanded => None,
        }
    }

    /// The next sparser state, or `None` when already compact.
    #[must_use]
    pub const fn step_down(self) -> Option<Self> {
        match self {
            Self::Compact => None,
            Self::Standard => Some(Self::Compact),
            Self::Expanded => Some(Self::Standard),
        }
    }

    /// Stable lowercase label, matching the serialized form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Standard => "standard",
            Self::Expanded => "expanded",
        }
    }
}

impl fmt::Display for Density {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-initiated density request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DensityAction {
    /// Tap/click on the card body: one step denser.
    Advance,
    /// Explicit collapse control: one step sparser.
    CollapseOne,
    /// Close control shown on an expanded card: one step sparser.
    Close,
}

/// Whether the grid is in display mode or in layout customization mode.
///
/// In `Customize`, density taps are ignored so that pointer gestures can be
/// interpreted as drags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InteractionMode {
    #[default]
    Display,
    Customize,
}

impl InteractionMode {
    /// Whether density actions are honoured in this mode.
    #[must_use]
    pub const fn accepts_density_actions(self) -> bool {
        matches!(self, Self::Display)
    }
}

/// A density change that actually happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DensityChange {
    pub from: Density,
    pub to: Density,
}

/// Apply `action` to `density`.
///
/// Returns the resulting density, which equals the input for no-op actions.
#[must_use]
pub const fn transition(density: Density, action: DensityAction) -> Density {
    let next = match action {
        DensityAction::Advance => density.step_up(),
        DensityAction::CollapseOne | DensityAction::Close => density.step_down(),
    };
    match next {
        Some(d) => d,
        None => density,
    }
}
