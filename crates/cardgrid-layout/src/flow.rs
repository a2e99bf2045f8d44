#![forbid(unsafe_code)]

//! Row-major flow placement.
//!
//! Cards are placed left to right in order. A card spans
//! `min(size.width, columns)` cells and wraps to a new row when it does not
//! fit in what remains of the current one. There is no backfilling: a later,
//! narrower card never jumps into a gap left on an earlier row. The same
//! placement feeds both rendering positions and the space detector's height
//! estimate, so the two never disagree.

use std::ops::Range;

use cardgrid_core::{CardSize, GridPosition};

/// Result of flowing a sequence of cards into a fixed column count.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FlowLayout {
    /// Placement per input item, in input order.
    pub positions: Vec<GridPosition>,
    /// Item index ranges per visual row band.
    pub rows: Vec<Range<usize>>,
}

impl FlowLayout {
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Flow `sizes` into `columns` columns. `columns` of zero is treated as one.
#[must_use]
pub fn flow(sizes: &[CardSize], columns: u16) -> FlowLayout {
    let columns = columns.max(1);
    let mut positions = Vec::with_capacity(sizes.len());
    let mut rows = Vec::new();

    let mut row: u16 = 0;
    let mut col: u16 = 0;
    let mut band_height: u16 = 0;
    let mut band_start = 0usize;

    for (i, size) in sizes.iter().enumerate() {
        let span = size.width.min(columns);
        if col > 0 && col + span > columns {
            rows.push(band_start..i);
            row = row.saturating_add(band_height.max(1));
            col = 0;
            band_height = 0;
            band_start = i;
        }
        positions.push(GridPosition::new(row, col));
        col += span;
        band_height = band_height.max(size.height);
    }
    if band_start < sizes.len() {
        rows.push(band_start..sizes.len());
    }

    FlowLayout { positions, rows }
}
