#![forbid(unsafe_code)]

//! cardgrid public facade crate.
//!
//! An adaptive dashboard card grid engine: cards change density on tap,
//! collapse automatically when the viewport gets tight (with undo), reorder
//! by drag in a customization mode, and persist their arrangement.
//!
//! This crate re-exports the stable surface of the internal crates and
//! offers a prelude for day-to-day use.
//!
//! ```
//! use cardgrid::prelude::*;
//!
//! let clock = ManualClock::new(Timestamp::from_millis(0));
//! let mut deck = CardDeck::builder(MemoryStorage::new())
//!     .clock(clock.clone())
//!     .card(Card::new("docs", CardKind::Institutional), CardContent::new("Docs"))
//!     .card(Card::new("ai", CardKind::Ai), CardContent::new("Assistant"))
//!     .build()?;
//!
//! deck.apply_density(&CardId::from("ai"), DensityAction::Advance);
//! deck.evaluate_space(Viewport::new(1280, 900));
//! assert_eq!(deck.card(&CardId::from("ai")).unwrap().density, Density::Expanded);
//! # Ok::<(), cardgrid::Error>(())
//! ```

pub mod error;

// --- Core re-exports -------------------------------------------------------

pub use cardgrid_core::{
    ActionRef, Card, CardContent, CardId, CardKind, CardSize, Clock, Density, DensityAction,
    DensityChange, GridPosition, InteractionMode, ManualClock, Metric, Priority, SystemClock,
    Timestamp,
};

// --- Layout re-exports -----------------------------------------------------

pub use cardgrid_layout::{
    AutoCollapseSettings, Breakpoint, Breakpoints, DragRejected, DragSession, LayoutSnapshot,
    MAX_COLUMNS, Placement, Reorder, Responsive, SpaceConfig, SpaceDetector, SpaceSnapshot,
    Viewport,
};

// --- Runtime re-exports ----------------------------------------------------

pub use cardgrid_runtime::{
    CardDeck, CardView, ConfigError, DeckBuilder, DeckConfig, DeckError, ExportFile, FileStorage,
    ImportError, MemoryStorage, Notice, NoticeAction, NoticeKind, NoticeLevel, StorageBackend,
    StorageError, TickReport,
};

// --- Errors ---------------------------------------------------------------

pub use error::{Error, Fallback, Result};

// --- Prelude ---------------------------------------------------------------

/// Common imports for hosts.
pub mod prelude {
    pub use crate::{
        Card, CardContent, CardDeck, CardId, CardKind, CardSize, Clock, DeckConfig, Density,
        DensityAction, FileStorage, ManualClock, MemoryStorage, NoticeAction, NoticeKind,
        Priority, StorageBackend, SystemClock, Timestamp, Viewport,
    };

    pub use crate::{Error, Fallback, Result};

    pub use crate::{core, layout, runtime};
}

pub use cardgrid_core as core;
pub use cardgrid_layout as layout;
pub use cardgrid_runtime as runtime;
