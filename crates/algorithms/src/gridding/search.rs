//! Radius-bounded cell search around a sample
//!
//! Instead of testing every cell of the grid, the search starts at the cell
//! holding the sample and walks outward through the four quadrants around
//! it. Inside a quadrant it scans line by line: cells along the inner axis
//! are visited until one falls outside the radius, then the scan moves one
//! step along the outer axis and restarts from the line's first cell. The
//! quadrant is done when a line's first cell is already out of range.
//!
//! ```text
//!   2 2 2 1 1      rows grow downward, O is the sample's cell
//!   2 2 2 1 1
//!   3 3 O 1 1      1: right of O, walking rows upward
//!   3 3 4 4 4      2: above O, walking columns leftward
//!   3 3 4 4 4      3: left of O, walking rows downward
//!                  4: below O, walking columns rightward
//! ```
//!
//! The quadrants tile the plane around the origin cell `O` without overlap,
//! so every cell is visited at most once. The origin cell is checked last.

use super::CellLayout;

/// One quadrant walk: the first cell of the first line, the step along a
/// line, and the step from one line to the next.
#[derive(Debug, Clone, Copy)]
struct Quadrant {
    start: (i64, i64),
    inner: (i64, i64),
    outer: (i64, i64),
}

impl Quadrant {
    fn around(i0: i64, j0: i64) -> [Quadrant; 4] {
        [
            Quadrant::new((i0.saturating_add(1), j0), (1, 0), (0, -1)),
            Quadrant::new((i0, j0.saturating_sub(1)), (0, -1), (-1, 0)),
            Quadrant::new((i0.saturating_sub(1), j0), (-1, 0), (0, 1)),
            Quadrant::new((i0, j0.saturating_add(1)), (0, 1), (1, 0)),
        ]
    }

    fn new(start: (i64, i64), inner: (i64, i64), outer: (i64, i64)) -> Self {
        Self { start, inner, outer }
    }
}

/// Whether stepping from `cell` along `step` can only move further away
/// from the grid, i.e. the cell is already past the edge the step heads to.
fn past_edge(layout: &CellLayout, cell: (i64, i64), step: (i64, i64)) -> bool {
    let beyond = |pos: i64, dir: i64, len: usize| match dir {
        1 => pos >= len as i64,
        -1 => pos < 0,
        _ => false,
    };
    beyond(cell.0, step.0, layout.width()) || beyond(cell.1, step.1, layout.height())
}

/// Move `cell` along `step` up to the near edge of the grid if it lies
/// before it. Distances grow monotonically along a quadrant's steps, so the
/// skipped cells are closer than the entry cell and need no visit of their own.
fn enter(layout: &CellLayout, cell: (i64, i64), step: (i64, i64)) -> (i64, i64) {
    let clamp = |pos: i64, dir: i64, len: usize| match dir {
        1 => pos.max(0),
        -1 => pos.min(len as i64 - 1),
        _ => pos,
    };
    (
        clamp(cell.0, step.0, layout.width()),
        clamp(cell.1, step.1, layout.height()),
    )
}

#[inline]
fn advance(cell: (i64, i64), step: (i64, i64)) -> (i64, i64) {
    (cell.0.saturating_add(step.0), cell.1.saturating_add(step.1))
}

/// Call `visit(i, j, distance)` for every in-grid cell whose center lies
/// strictly within `radius` of grid-local (`x`, `y`).
///
/// Samples near or beyond the border still reach the in-grid cells they
/// cover; cells outside the grid are never visited.
pub fn for_each_in_radius<F>(layout: &CellLayout, x: f64, y: f64, radius: f64, mut visit: F)
where
    F: FnMut(usize, usize, f64),
{
    if !layout.reaches(x, y, radius) {
        return;
    }

    let i0 = layout.horizontal_index(x);
    let j0 = layout.vertical_index(y);

    for quadrant in Quadrant::around(i0, j0) {
        let mut line = enter(layout, quadrant.start, quadrant.outer);
        while !past_edge(layout, line, quadrant.outer) && !past_edge(layout, line, quadrant.inner) {
            // The line's first cell is its closest; once it misses, every
            // later line misses too.
            if layout.distance(line.0, line.1, x, y) >= radius {
                break;
            }

            let mut cell = enter(layout, line, quadrant.inner);
            while !past_edge(layout, cell, quadrant.inner) {
                let d = layout.distance(cell.0, cell.1, x, y);
                if d >= radius {
                    break;
                }
                if layout.contains(cell.0, cell.1) {
                    visit(cell.0 as usize, cell.1 as usize, d);
                }
                cell = advance(cell, quadrant.inner);
            }

            line = enter(layout, advance(line, quadrant.outer), quadrant.outer);
        }
    }

    // A sample always lies in its origin cell, but the cell only counts it
    // when the cell center is within the radius, like every other cell.
    if layout.contains(i0, j0) {
        let d = layout.distance(i0, j0, x, y);
        if d < radius {
            visit(i0 as usize, j0 as usize, d);
        }
    }
}
