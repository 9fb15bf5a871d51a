//! Gap filling for cells that received no samples
//!
//! Each empty cell is estimated from the populated cells of the square window
//! around it, weighting every neighbor by the inverse of its Chebyshev step
//! distance. Estimates are computed from the bands as they stand after
//! normalization and only written once every cell has been considered, so a
//! filled cell never feeds another cell's estimate.

use ndarray::Array2;
use ptgrid_core::Window;

use super::Band;
use crate::maybe_rayon::flat_map_rows;

/// Estimate one empty cell at (`col`, `row`); `None` when the window holds no
/// populated cell.
fn estimate(
    populated: &Array2<bool>,
    bands: &[Band],
    col: usize,
    row: usize,
    size: usize,
) -> Option<Vec<f64>> {
    let (rows, cols) = populated.dim();
    let window = Window::clamped(col, row, size, cols, rows);

    // min/max start from 0 too: they are averaged here, not compared
    let mut sums = vec![0.0; bands.len()];
    let mut dist_sum = 0.0;

    for (src_col, src_row) in window.neighbors() {
        if !populated[(src_row, src_col)] {
            continue;
        }
        let distance = window.chebyshev(src_col, src_row) as f64;
        for (sum, band) in sums.iter_mut().zip(bands) {
            *sum += band.values()[(src_row, src_col)] / distance;
        }
        dist_sum += 1.0 / distance;
    }

    (dist_sum > 0.0).then(|| sums.into_iter().map(|s| s / dist_sum).collect())
}

/// Fill every empty cell of `bands` from its `size`-step window, writing
/// `no_data` where no populated neighbor exists.
///
/// Returns the mask of cells that received an estimate.
pub fn window_fill(
    populated: &Array2<bool>,
    bands: &mut [Band],
    size: usize,
    no_data: f64,
) -> Array2<bool> {
    let (rows, cols) = populated.dim();

    let estimates = {
        let bands: &[Band] = bands;
        flat_map_rows(rows, |row| {
            (0..cols)
                .filter(|&col| !populated[(row, col)])
                .map(|col| (row, col, estimate(populated, bands, col, row, size)))
                .collect::<Vec<_>>()
        })
    };

    let mut estimated = Array2::from_elem((rows, cols), false);
    for (row, col, values) in estimates {
        match values {
            Some(values) => {
                for (band, value) in bands.iter_mut().zip(values) {
                    band.values_mut()[(row, col)] = value;
                }
                estimated[(row, col)] = true;
            }
            None => {
                for band in bands.iter_mut() {
                    band.values_mut()[(row, col)] = no_data;
                }
            }
        }
    }
    estimated
}

/// Write `no_data` into every empty cell of `bands`.
pub fn fill_no_data(populated: &Array2<bool>, bands: &mut [Band], no_data: f64) {
    for band in bands.iter_mut() {
        ndarray::Zip::from(band.values_mut())
            .and(populated)
            .for_each(|v, &p| {
                if !p {
                    *v = no_data;
                }
            });
    }
}
