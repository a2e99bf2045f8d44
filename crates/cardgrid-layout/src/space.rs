#![forbid(unsafe_code)]

//! Space detection: viewport → column count and a collapse-needed signal.
//!
//! [`SpaceDetector`] is a pure query object. Given a [`Viewport`], the cards'
//! current footprints, and an optional manual column override, it returns a
//! [`SpaceSnapshot`]:
//!
//! - `grid_columns` from the breakpoint table (or the override),
//! - `available_card_space_per_card` = effective container width / columns,
//! - `estimated_height` of the flowed grid at the cards' *current* densities,
//! - `should_auto_collapse` when that height exceeds the comfortable height
//!   or per-card width drops below the configured minimum.
//!
//! # Invariants
//!
//! 1. `grid_columns` is always in `1..=MAX_COLUMNS`.
//! 2. Lowering any card's density never increases `estimated_height`.
//! 3. Evaluation has no side effects.

use cardgrid_core::{CardSize, Density};
use serde::{Deserialize, Serialize};

use crate::breakpoint::{Breakpoint, Breakpoints, Responsive, default_columns};
use crate::flow::flow;

/// Upper bound for any column count, detected or manual.
pub const MAX_COLUMNS: u16 = 6;

/// Viewport size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Estimated rendered height (px) of one grid cell at each density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DensityHeights {
    pub compact: u32,
    pub standard: u32,
    pub expanded: u32,
}

impl DensityHeights {
    #[must_use]
    pub const fn for_density(&self, density: Density) -> u32 {
        match density {
            Density::Compact => self.compact,
            Density::Standard => self.standard,
            Density::Expanded => self.expanded,
        }
    }
}

impl Default for DensityHeights {
    fn default() -> Self {
        Self {
            compact: 140,
            standard: 260,
            expanded: 460,
        }
    }
}

/// Tunables for the space heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpaceConfig {
    /// Horizontal padding on each side of the grid container.
    pub container_padding: u32,
    /// Gap between rows (and columns) of cards.
    pub gap: u32,
    /// Below this per-card width, the detector asks for a collapse.
    pub min_card_width: u32,
    /// Comfortable grid height as a multiple of viewport height.
    pub comfortable_height_ratio: f32,
    pub density_heights: DensityHeights,
}

impl Default for SpaceConfig {
    fn default() -> Self {
        Self {
            container_padding: 24,
            gap: 24,
            min_card_width: 240,
            comfortable_height_ratio: 1.5,
            density_heights: DensityHeights::default(),
        }
    }
}

/// What the detector needs to know about one card, in render order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footprint {
    pub density: Density,
    pub size: CardSize,
}

/// Output of one space evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpaceSnapshot {
    pub viewport_width: u32,
    pub breakpoint: Breakpoint,
    pub grid_columns: u16,
    pub available_card_space_per_card: u32,
    pub estimated_height: u64,
    pub comfortable_height: u64,
    pub should_auto_collapse: bool,
}

/// Translates viewport size and card footprints into a layout recommendation.
#[derive(Debug, Clone)]
pub struct SpaceDetector {
    breakpoints: Breakpoints,
    columns: Responsive<u16>,
    config: SpaceConfig,
}

impl Default for SpaceDetector {
    fn default() -> Self {
        Self::new(Breakpoints::DEFAULT, default_columns(), SpaceConfig::default())
    }
}

impl SpaceDetector {
    #[must_use]
    pub fn new(breakpoints: Breakpoints, columns: Responsive<u16>, config: SpaceConfig) -> Self {
        Self {
            breakpoints,
            columns,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &SpaceConfig {
        &self.config
    }

    #[must_use]
    pub fn breakpoints(&self) -> Breakpoints {
        self.breakpoints
    }

    /// Column count for a width, honouring a manual override.
    #[must_use]
    pub fn columns_for(&self, width: u32, column_override: Option<u16>) -> u16 {
        let cols = match column_override {
            Some(cols) => cols,
            None => *self.columns.resolve(self.breakpoints.classify_width(width)),
        };
        cols.clamp(1, MAX_COLUMNS)
    }

    /// Width left for cards once container padding is removed.
    #[must_use]
    pub fn effective_width(&self, width: u32) -> u32 {
        width.saturating_sub(self.config.container_padding.saturating_mul(2))
    }

    /// Estimated grid height for `cards` flowed into `columns`.
    #[must_use]
    pub fn estimate_height(&self, cards: &[Footprint], columns: u16) -> u64 {
        let sizes: Vec<CardSize> = cards.iter().map(|c| c.size).collect();
        let layout = flow(&sizes, columns);
        let gap = u64::from(self.config.gap);
        let heights = &self.config.density_heights;

        let mut total = 0u64;
        for (band, range) in layout.rows.iter().enumerate() {
            if band > 0 {
                total += gap;
            }
            let band_height = cards[range.clone()]
                .iter()
                .map(|c| {
                    let cells = u64::from(c.size.height);
                    u64::from(heights.for_density(c.density)) * cells
                        + gap * cells.saturating_sub(1)
                })
                .max()
                .unwrap_or(0);
            total += band_height;
        }
        total
    }

    /// Full evaluation.
    #[must_use]
    pub fn evaluate(
        &self,
        viewport: Viewport,
        cards: &[Footprint],
        column_override: Option<u16>,
    ) -> SpaceSnapshot {
        let breakpoint = self.breakpoints.classify_width(viewport.width);
        let grid_columns = self.columns_for(viewport.width, column_override);
        let available = self.effective_width(viewport.width) / u32::from(grid_columns);
        let estimated_height = self.estimate_height(cards, grid_columns);
        let comfortable_height =
            (f64::from(viewport.height) * f64::from(self.config.comfortable_height_ratio)) as u64;

        let too_tall = estimated_height > comfortable_height;
        let too_narrow = !cards.is_empty() && available < self.config.min_card_width;

        SpaceSnapshot {
            viewport_width: viewport.width,
            breakpoint,
            grid_columns,
            available_card_space_per_card: available,
            estimated_height,
            comfortable_height,
            should_auto_collapse: too_tall || too_narrow,
        }
    }
}
