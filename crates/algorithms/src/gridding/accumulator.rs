//! Per-cell running statistics
//!
//! References:
//! - Welford, B. P. (1962). Note on a method for calculating corrected sums
//!   of squares and products. Technometrics 4(3).
//! - Chan, T. F., Golub, G. H., LeVeque, R. J. (1979). Updating formulae and
//!   a pairwise algorithm for computing sample variances.
//! - Shepard, D. (1968). A two-dimensional interpolation function for
//!   irregularly-spaced data. ACM National Conference.

use ndarray::{Array2, Zip};

use super::{Band, OutputTypes, Statistic};

/// Distances below this are clamped before weighting, so a sample sitting
/// on a cell center dominates the cell's IDW value instead of dividing by zero.
pub const IDW_SNAP_DISTANCE: f64 = 1e-10;

/// Running inverse-distance sums: Σ(z/d) and Σ(1/d)
#[derive(Debug, Clone)]
struct IdwSums {
    weighted: Array2<f64>,
    weights: Array2<f64>,
}

/// Accumulator buffers for every cell of a grid, indexed (row, col).
///
/// Only the buffers implied by the requested statistics are allocated.
/// `count` always exists since it decides which cells are empty.
#[derive(Debug, Clone)]
pub struct Accumulators {
    count: Array2<f64>,
    min: Option<Array2<f64>>,
    max: Option<Array2<f64>>,
    mean: Option<Array2<f64>>,
    /// Sum of squared deviations (M2) until normalized into a standard deviation
    m2: Option<Array2<f64>>,
    idw: Option<IdwSums>,
}

impl Accumulators {
    pub fn new(width: usize, height: usize, outputs: &OutputTypes) -> Self {
        let shape = (height, width);
        let buffer = |wanted: bool, init: f64| wanted.then(|| Array2::from_elem(shape, init));

        Self {
            count: Array2::zeros(shape),
            min: buffer(outputs.contains(Statistic::Min), f64::INFINITY),
            max: buffer(outputs.contains(Statistic::Max), f64::NEG_INFINITY),
            mean: buffer(outputs.tracks_mean(), 0.0),
            m2: buffer(outputs.contains(Statistic::StdDev), 0.0),
            idw: outputs.contains(Statistic::Idw).then(|| IdwSums {
                weighted: Array2::zeros(shape),
                weights: Array2::zeros(shape),
            }),
        }
    }

    /// Sample counts, indexed (row, col)
    pub fn count(&self) -> &Array2<f64> {
        &self.count
    }

    /// Fold one sample `value` at `dist` from the center of cell (i, j).
    ///
    /// Mean and M2 move together (Welford): the mean is kept current even
    /// when only the standard deviation was requested.
    pub fn update(&mut self, i: usize, j: usize, value: f64, dist: f64) {
        let cell = (j, i);

        let count = &mut self.count[cell];
        *count += 1.0;
        let n = *count;

        if let Some(min) = &mut self.min {
            let m = &mut min[cell];
            *m = m.min(value);
        }
        if let Some(max) = &mut self.max {
            let m = &mut max[cell];
            *m = m.max(value);
        }

        if let Some(mean) = &mut self.mean {
            let mean = &mut mean[cell];
            let delta = value - *mean;
            *mean += delta / n;
            if let Some(m2) = &mut self.m2 {
                m2[cell] += delta * (value - *mean);
            }
        }

        if let Some(idw) = &mut self.idw {
            let d = dist.max(IDW_SNAP_DISTANCE);
            idw.weighted[cell] += value / d;
            idw.weights[cell] += 1.0 / d;
        }
    }

    /// Fold another set of accumulators over the same grid into this one.
    ///
    /// Equivalent, up to rounding, to having ingested both sample streams
    /// into a single set.
    pub fn merge(&mut self, other: &Accumulators) {
        debug_assert_eq!(self.count.dim(), other.count.dim());

        if let (Some(a), Some(b)) = (&mut self.min, &other.min) {
            Zip::from(a).and(b).for_each(|a, &b| *a = a.min(b));
        }
        if let (Some(a), Some(b)) = (&mut self.max, &other.max) {
            Zip::from(a).and(b).for_each(|a, &b| *a = a.max(b));
        }
        if let (Some(a), Some(b)) = (&mut self.idw, &other.idw) {
            a.weighted += &b.weighted;
            a.weights += &b.weights;
        }

        // Chan et al. pairwise combination of (n, mean, M2)
        if let (Some(mean_a), Some(mean_b)) = (&mut self.mean, &other.mean) {
            match (&mut self.m2, &other.m2) {
                (Some(m2_a), Some(m2_b)) => {
                    Zip::from(mean_a)
                        .and(m2_a)
                        .and(&self.count)
                        .and(mean_b)
                        .and(m2_b)
                        .and(&other.count)
                        .for_each(|ma, sa, &na, &mb, &sb, &nb| {
                            let (mean, m2) = combine(na, *ma, *sa, nb, mb, sb);
                            *ma = mean;
                            *sa = m2;
                        });
                }
                _ => {
                    Zip::from(mean_a)
                        .and(&self.count)
                        .and(mean_b)
                        .and(&other.count)
                        .for_each(|ma, &na, &mb, &nb| {
                            *ma = combine(na, *ma, 0.0, nb, mb, 0.0).0;
                        });
                }
            }
        }

        self.count += &other.count;
    }

    /// First two steps of finalization, applied to non-empty cells only:
    /// M2 becomes the population standard deviation and the IDW sum becomes
    /// the weighted estimate.
    pub fn normalize(&mut self) {
        if let Some(m2) = &mut self.m2 {
            Zip::from(m2).and(&self.count).for_each(|s, &n| {
                if n > 0.0 {
                    *s = (*s / n).sqrt();
                }
            });
        }
        if let Some(idw) = &mut self.idw {
            Zip::from(&mut idw.weighted)
                .and(&idw.weights)
                .and(&self.count)
                .for_each(|v, &w, &n| {
                    if n > 0.0 {
                        *v /= w;
                    }
                });
        }
    }

    /// Split into the count buffer and the requested non-count statistics,
    /// in band order.
    pub fn into_bands(self, outputs: &OutputTypes) -> (Array2<f64>, Vec<Band>) {
        let Accumulators {
            count,
            mut min,
            mut max,
            mut mean,
            mut m2,
            mut idw,
        } = self;

        let bands = outputs
            .iter()
            .filter_map(|statistic| {
                let values = match statistic {
                    Statistic::Count => None,
                    Statistic::Min => min.take(),
                    Statistic::Max => max.take(),
                    Statistic::Mean => mean.take(),
                    Statistic::StdDev => m2.take(),
                    Statistic::Idw => idw.take().map(|sums| sums.weighted),
                };
                values.map(|values| Band::new(statistic, values))
            })
            .collect();

        (count, bands)
    }
}

/// Combine two partial (count, mean, M2) triples.
#[inline]
fn combine(na: f64, ma: f64, sa: f64, nb: f64, mb: f64, sb: f64) -> (f64, f64) {
    if nb <= 0.0 {
        return (ma, sa);
    }
    if na <= 0.0 {
        return (mb, sb);
    }
    let n = na + nb;
    let delta = mb - ma;
    (ma + delta * nb / n, sa + sb + delta * delta * na * nb / n)
}
