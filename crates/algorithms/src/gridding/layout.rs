//! Mapping between grid-local world coordinates and cell indices
//!
//! Grid-local coordinates put (0, 0) at the lower-left corner of the extent,
//! with y growing upward. Cell rows grow downward: row 0 is the top row.

/// Cell geometry of a `width x height` grid of square cells.
///
/// Indices are signed so that cells just outside the grid can be named
/// while searching around samples near the border.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellLayout {
    width: usize,
    height: usize,
    edge_length: f64,
}

impl CellLayout {
    pub fn new(width: usize, height: usize, edge_length: f64) -> Self {
        Self {
            width,
            height,
            edge_length,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Column holding grid-local `x`.
    ///
    /// Coordinates beyond the extent map to the first column past the edge
    /// (`-1` or `width`), so far-away samples never overflow the index math.
    #[inline]
    pub fn horizontal_index(&self, x: f64) -> i64 {
        (x / self.edge_length).floor().clamp(-1.0, self.width as f64) as i64
    }

    /// Row holding grid-local `y`, clamped like [`Self::horizontal_index`]
    /// to one row past the top or bottom edge.
    #[inline]
    pub fn vertical_index(&self, y: f64) -> i64 {
        let from_bottom = (y / self.edge_length).floor().clamp(-1.0, self.height as f64) as i64;
        self.height as i64 - from_bottom - 1
    }

    /// Grid-local x of the center of column `i`
    #[inline]
    pub fn horizontal_pos(&self, i: i64) -> f64 {
        (i as f64 + 0.5) * self.edge_length
    }

    /// Grid-local y of the center of row `j`
    #[inline]
    pub fn vertical_pos(&self, j: i64) -> f64 {
        (self.height as f64 - j as f64 - 0.5) * self.edge_length
    }

    /// Euclidean distance from the center of cell (i, j) to (x, y)
    #[inline]
    pub fn distance(&self, i: i64, j: i64, x: f64, y: f64) -> f64 {
        (self.horizontal_pos(i) - x).hypot(self.vertical_pos(j) - y)
    }

    /// Whether (i, j) names a cell of the grid
    #[inline]
    pub fn contains(&self, i: i64, j: i64) -> bool {
        i >= 0 && j >= 0 && (i as u64) < self.width as u64 && (j as u64) < self.height as u64
    }

    /// Whether a disc of `radius` around (x, y) can hold any cell center.
    ///
    /// Cell centers lie inside the extent, so a disc that stays clear of the
    /// extent rectangle touches none of them.
    pub fn reaches(&self, x: f64, y: f64, radius: f64) -> bool {
        let max_x = self.width as f64 * self.edge_length;
        let max_y = self.height as f64 * self.edge_length;
        let dx = (0.0 - x).max(x - max_x).max(0.0);
        let dy = (0.0 - y).max(y - max_y).max(0.0);
        dx.hypot(dy) < radius
    }

    /// Row-major flat index of an in-grid cell
    #[inline]
    pub fn index(&self, i: usize, j: usize) -> usize {
        j * self.width + i
    }
}
