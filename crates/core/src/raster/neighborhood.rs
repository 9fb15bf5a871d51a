//! Square neighborhoods clamped to raster bounds

use std::ops::Range;

/// A square window of `radius` steps around a center cell, clamped to the
/// bounds of a `cols x rows` grid.
///
/// ```text
/// radius = 1, center (0, 0) in a 4x4 grid:
///
///   C x . .
///   x x . .
///   . . . .
///   . . . .
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    center_col: usize,
    center_row: usize,
    cols: Range<usize>,
    rows: Range<usize>,
}

impl Window {
    /// Window around (`col`, `row`). The center must lie inside the grid.
    pub fn clamped(col: usize, row: usize, radius: usize, cols: usize, rows: usize) -> Self {
        debug_assert!(col < cols && row < rows, "window center outside grid");
        Self {
            center_col: col,
            center_row: row,
            cols: col.saturating_sub(radius)..col.saturating_add(radius).saturating_add(1).min(cols),
            rows: row.saturating_sub(radius)..row.saturating_add(radius).saturating_add(1).min(rows),
        }
    }

    /// Column range covered by the window
    pub fn cols(&self) -> Range<usize> {
        self.cols.clone()
    }

    /// Row range covered by the window
    pub fn rows(&self) -> Range<usize> {
        self.rows.clone()
    }

    /// Whether (`col`, `row`) is the window's center
    pub fn is_center(&self, col: usize, row: usize) -> bool {
        col == self.center_col && row == self.center_row
    }

    /// Chebyshev (max-axis) step distance from the center to (`col`, `row`)
    pub fn chebyshev(&self, col: usize, row: usize) -> usize {
        col.abs_diff(self.center_col).max(row.abs_diff(self.center_row))
    }

    /// Cells of the window in row-major order, center excluded, as (col, row)
    pub fn neighbors(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.rows()
            .flat_map(move |row| self.cols().map(move |col| (col, row)))
            .filter(move |&(col, row)| !self.is_center(col, row))
    }
}
