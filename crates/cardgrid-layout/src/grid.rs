#![forbid(unsafe_code)]

//! Grid layout manager: card ordering, drag-to-reorder, column overrides.
//!
//! The manager owns the order array (`order[i]` is the card rendered at
//! index `i`). Cards' `order` fields are relabelled from it after every
//! commit, so they always form the permutation `0..n`.
//!
//! # Drag State Machine
//!
//! ```text
//!   Idle ──begin_drag(id)──► Dragging{origin, target}
//!     ▲                        │    │
//!     │   end_drag (commit)    │    │ drag_over(i): target = clamp(i)
//!     └────────────────────────┘    │
//!     └──── cancel_drag / leave Customize ◄┘
//! ```
//!
//! # Invariants
//!
//! 1. Drags only begin in [`InteractionMode::Customize`].
//! 2. Target indices are clamped to `0..len`; a commit never fails.
//! 3. A commit moves one card; every card between origin and target shifts
//!    by exactly one position.
//! 4. Nothing here reads or writes density.
//! 5. Column changes trigger reflow only; the order array is untouched.

use cardgrid_core::{CardId, CardSize, GridPosition, InteractionMode};

use crate::flow::flow;
use crate::space::MAX_COLUMNS;

/// A committed move from one index to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reorder {
    pub card: CardId,
    pub from: usize,
    pub to: usize,
}

/// An in-progress drag gesture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragSession {
    pub card: CardId,
    pub origin: usize,
    pub target: usize,
    /// Number of drag-over frames seen. Diagnostics only.
    pub frames: u32,
}

/// Why a drag could not begin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragRejected {
    /// Not in customization mode.
    NotCustomizing,
    /// The card is not part of this grid.
    UnknownCard(CardId),
    /// Another drag is already in progress.
    AlreadyDragging(CardId),
}

impl std::fmt::Display for DragRejected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotCustomizing => write!(f, "layout is not in customization mode"),
            Self::UnknownCard(id) => write!(f, "card {id} is not in the grid"),
            Self::AlreadyDragging(id) => write!(f, "card {id} is already being dragged"),
        }
    }
}

impl std::error::Error for DragRejected {}

/// Placement of one card for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub card: CardId,
    pub index: usize,
    pub position: GridPosition,
}

/// Owns ordering and the interaction mode of the grid.
#[derive(Debug, Clone, Default)]
pub struct GridLayoutManager {
    order: Vec<CardId>,
    mode: InteractionMode,
    drag: Option<DragSession>,
    column_override: Option<u16>,
}

impl GridLayoutManager {
    /// Create a manager with cards in the given order.
    #[must_use]
    pub fn new(order: Vec<CardId>) -> Self {
        Self {
            order,
            ..Self::default()
        }
    }

    // ====================================================================
    // Queries
    // ====================================================================

    #[must_use]
    pub fn order(&self) -> &[CardId] {
        &self.order
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    #[must_use]
    pub fn index_of(&self, id: &CardId) -> Option<usize> {
        self.order.iter().position(|c| c == id)
    }

    #[must_use]
    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    #[must_use]
    pub fn drag(&self) -> Option<&DragSession> {
        self.drag.as_ref()
    }

    #[must_use]
    pub fn column_override(&self) -> Option<u16> {
        self.column_override
    }

    /// The order a renderer should show right now, including an uncommitted
    /// drag preview.
    #[must_use]
    pub fn preview_order(&self) -> Vec<CardId> {
        let mut order = self.order.clone();
        if let Some(drag) = &self.drag {
            let card = order.remove(drag.origin);
            order.insert(drag.target, card);
        }
        order
    }

    /// Placement of every card in committed order for `columns`.
    ///
    /// `size_of` supplies each card's footprint.
    #[must_use]
    pub fn placements(
        &self,
        columns: u16,
        size_of: impl Fn(&CardId) -> CardSize,
    ) -> Vec<Placement> {
        let sizes: Vec<CardSize> = self.order.iter().map(&size_of).collect();
        let layout = flow(&sizes, columns);
        self.order
            .iter()
            .zip(layout.positions)
            .enumerate()
            .map(|(index, (card, position))| Placement {
                card: card.clone(),
                index,
                position,
            })
            .collect()
    }

    // ====================================================================
    // Mode and columns
    // ====================================================================

    /// Switch interaction mode. Leaving customization cancels any drag.
    ///
    /// Returns the cancelled drag, if one was active.
    pub fn set_mode(&mut self, mode: InteractionMode) -> Option<DragSession> {
        self.mode = mode;
        if mode == InteractionMode::Customize {
            None
        } else {
            self.drag.take()
        }
    }

    /// Set or clear the manual column override. Returns `true` if it changed.
    pub fn set_column_override(&mut self, columns: Option<u16>) -> bool {
        let columns = columns.map(|c| c.clamp(1, MAX_COLUMNS));
        if self.column_override == columns {
            return false;
        }
        self.column_override = columns;
        true
    }

    // ====================================================================
    // Drag gesture
    // ====================================================================

    /// Start dragging `card`.
    pub fn begin_drag(&mut self, card: &CardId) -> Result<&DragSession, DragRejected> {
        if self.mode != InteractionMode::Customize {
            return Err(DragRejected::NotCustomizing);
        }
        if let Some(active) = &self.drag {
            return Err(DragRejected::AlreadyDragging(active.card.clone()));
        }
        let origin = self
            .index_of(card)
            .ok_or_else(|| DragRejected::UnknownCard(card.clone()))?;
        Ok(&*self.drag.insert(DragSession {
            card: card.clone(),
            origin,
            target: origin,
            frames: 0,
        }))
    }

    /// Update the drop target. Out-of-range targets are clamped.
    ///
    /// Returns the clamped target, or `None` when no drag is active.
    pub fn drag_over(&mut self, target: usize) -> Option<usize> {
        let last = self.order.len().saturating_sub(1);
        let drag = self.drag.as_mut()?;
        drag.target = target.min(last);
        drag.frames = drag.frames.saturating_add(1);
        Some(drag.target)
    }

    /// Commit the active drag. Returns `None` when idle or when the card was
    /// dropped where it started.
    pub fn end_drag(&mut self) -> Option<Reorder> {
        let drag = self.drag.take()?;
        self.commit_move(drag.origin, drag.target)
    }

    /// Abandon the active drag without changing order.
    pub fn cancel_drag(&mut self) -> Option<DragSession> {
        self.drag.take()
    }

    /// Move the card at `from` to `to` without a gesture. Both indices are
    /// clamped. Returns `None` if nothing moved.
    ///
    /// Refused while a drag is active: the session holds its origin as an
    /// index, which a keyboard move would invalidate.
    pub fn move_card(&mut self, from: usize, to: usize) -> Option<Reorder> {
        if self.order.is_empty() || self.drag.is_some() {
            return None;
        }
        let last = self.order.len() - 1;
        self.commit_move(from.min(last), to.min(last))
    }

    fn commit_move(&mut self, from: usize, to: usize) -> Option<Reorder> {
        if from == to || from >= self.order.len() {
            return None;
        }
        let card = self.order.remove(from);
        let to = to.min(self.order.len());
        self.order.insert(to, card.clone());
        Some(Reorder { card, from, to })
    }

    // ====================================================================
    // Wholesale replacement
    // ====================================================================

    /// Replace the order array (snapshot restore, reset). Cancels any drag.
    pub fn replace_order(&mut self, order: Vec<CardId>) {
        self.drag = None;
        self.order = order;
    }
}
