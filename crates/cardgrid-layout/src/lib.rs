#![forbid(unsafe_code)]

//! Layout for the cardgrid engine: where cards go and how much room they have.
//!
//! # Key Components
//!
//! - [`Breakpoints`] and [`Responsive`] - width tiers with inherited values
//! - [`SpaceDetector`] - viewport to column count and a collapse-needed signal
//! - [`flow`](flow::flow) - row-major placement shared by rendering and height estimates
//! - [`GridLayoutManager`] - order array, drag sessions, column override
//! - [`LayoutSnapshot`] - the persisted arrangement, versioned and validated
//!
//! Nothing in this crate owns cards. It reads footprints and order and
//! returns decisions; `cardgrid-runtime` applies them.

pub mod breakpoint;
pub mod flow;
pub mod grid;
pub mod snapshot;
pub mod space;

pub use breakpoint::{Breakpoint, Breakpoints, Responsive, ResponsiveTable, default_columns};
pub use flow::{FlowLayout, flow};
pub use grid::{DragRejected, DragSession, GridLayoutManager, Placement, Reorder};
pub use snapshot::{
    AutoCollapseSettings, CardRecord, LAYOUT_SCHEMA_VERSION, LayoutSnapshot, RestoreOutcome,
    SnapshotError, SnapshotMigrationError, migrate_snapshot,
};
pub use space::{
    DensityHeights, Footprint, MAX_COLUMNS, SpaceConfig, SpaceDetector, SpaceSnapshot, Viewport,
};
