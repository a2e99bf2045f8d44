#![forbid(unsafe_code)]

//! Core types for the cardgrid presentation engine.
//!
//! # Key Components
//!
//! - [`Card`] - identity, density, placement hints, and priority of one card
//! - [`Density`] and [`DensityAction`] - the per-card density state machine
//! - [`Clock`] - injectable time source shared by every timed decision
//! - [`CardContent`] - the opaque payload handed through to renderers
//!
//! # Role in cardgrid
//! `cardgrid-core` is the leaf crate. `cardgrid-layout` builds space detection
//! and ordering on top of it, and `cardgrid-runtime` owns the canonical card
//! collection that mutates these types.

pub mod card;
pub mod clock;
pub mod content;
pub mod density;

pub use card::{Card, CardId, CardKind, CardSize, GridPosition, Priority};
pub use clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use content::{ActionRef, CardContent, Metric};
pub use density::{Density, DensityAction, DensityChange, InteractionMode, transition};
