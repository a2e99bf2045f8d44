#![forbid(unsafe_code)]

//! cardgrid runtime
//!
//! This crate ties the card model and layout crates into a working deck:
//! one owner of card state, engines that act on it, and the persistence
//! plumbing behind it.
//!
//! # Key Components
//!
//! - [`CardDeck`] - canonical card collection and every mutation path
//! - [`AutoCollapseEngine`] - lowers card densities when space is tight, with undo
//! - [`LayoutPersistence`] - debounced autosave, load, import, export
//! - [`StorageBackend`] - key-value storage seam ([`MemoryStorage`], [`FileStorage`])
//! - [`NoticeQueue`] - bounded, deduplicated user notices
//! - [`DeckConfig`] - every tunable, loadable from TOML or JSON
//!
//! # How it fits in the system
//! The host owns the event loop. It forwards resizes, taps, and drags to
//! [`CardDeck`], calls [`CardDeck::tick`] periodically, and renders
//! [`CardDeck::view`]. Nothing here spawns threads or timers.

pub mod collapse;
pub mod config;
pub mod debounce;
pub mod deck;
pub mod notice;
pub mod persistence;
pub mod storage;

pub use collapse::{
    AutoCollapseEngine, AutoCollapseSettings, CollapseEntry, CollapseOutcome, CollapseRecord,
    UndoOutcome, collapse_ceiling,
};
pub use config::{ConfigError, DeckConfig};
pub use debounce::{Debouncer, DeferredHandle};
pub use deck::{CardDeck, CardView, DeckBuilder, DeckError, TickReport};
pub use notice::{
    Notice, NoticeAction, NoticeConfig, NoticeId, NoticeKind, NoticeLevel, NoticeQueue,
};
pub use persistence::{
    DecodeError, ExportFile, ImportError, LayoutPersistence, LoadOutcome, PersistenceConfig,
    SaveStatus, decode_snapshot, encode_snapshot, export_file, import_snapshot,
};
pub use storage::{FileStorage, MemoryStorage, StorageBackend, StorageError, StorageResult};
