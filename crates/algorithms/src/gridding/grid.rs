//! Point-to-grid accumulation

use std::ops::{Add, AddAssign};

use ndarray::{Array2, Zip};
use ptgrid_core::{Error, Result};
use tracing::{debug, trace, warn};

use super::accumulator::Accumulators;
use super::search::for_each_in_radius;
use super::window::{fill_no_data, window_fill};
use super::{Band, CellLayout, GridParams, GriddedBands, SamplePoint, Statistic};

/// Outcome of ingesting a batch of samples
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    /// Finite samples that were ingested
    pub accepted: usize,
    /// Samples skipped for having a non-finite coordinate or value
    pub rejected: usize,
}

impl Add for IngestSummary {
    type Output = IngestSummary;

    fn add(self, other: IngestSummary) -> IngestSummary {
        IngestSummary {
            accepted: self.accepted + other.accepted,
            rejected: self.rejected + other.rejected,
        }
    }
}

impl AddAssign for IngestSummary {
    fn add_assign(&mut self, other: IngestSummary) {
        *self = *self + other;
    }
}

/// A raster of running per-cell statistics fed by scattered samples.
///
/// Every sample updates all cells whose center lies within `radius` of it.
/// Once all samples are in, [`Grid::finalize`] consumes the grid and yields
/// the output bands, so nothing can be ingested after finalization.
///
/// # Example
///
/// ```
/// use ptgrid_algorithms::gridding::{Grid, GridParams, Statistic};
///
/// let params = GridParams {
///     width: 4,
///     height: 4,
///     radius: 0.8,
///     ..Default::default()
/// };
/// let mut grid = Grid::new(params).unwrap();
/// grid.add_point(1.5, 2.5, 10.0).unwrap();
/// grid.add_point(1.6, 2.4, 20.0).unwrap();
///
/// let bands = grid.finalize();
/// let mean = bands.data(Statistic::Mean).unwrap();
/// assert_eq!(mean[1 * 4 + 1], 15.0);
/// ```
#[derive(Debug, Clone)]
pub struct Grid {
    params: GridParams,
    layout: CellLayout,
    acc: Accumulators,
}

impl Grid {
    /// Validate `params` and allocate the accumulators it calls for
    pub fn new(params: GridParams) -> Result<Self> {
        params.validate()?;

        let layout = CellLayout::new(params.width, params.height, params.edge_length);
        let acc = Accumulators::new(params.width, params.height, &params.output_types);

        debug!(
            "Grid {}x{} cells of {}, radius {}, {} band(s), window {}",
            params.width,
            params.height,
            params.edge_length,
            params.radius,
            params.output_types.len(),
            params.window_size
        );

        Ok(Self {
            params,
            layout,
            acc,
        })
    }

    pub fn params(&self) -> &GridParams {
        &self.params
    }

    /// Number of output bands, one per requested statistic
    pub fn num_bands(&self) -> usize {
        self.params.output_types.len()
    }

    /// Samples counted so far per cell, indexed (row, col)
    pub fn counts(&self) -> &Array2<f64> {
        self.acc.count()
    }

    /// Ingest one sample given in world coordinates.
    ///
    /// Fails with [`Error::InvalidSample`] if any component is not finite, in
    /// which case the grid is left untouched.
    pub fn add_point(&mut self, x: f64, y: f64, z: f64) -> Result<()> {
        deposit(&self.params, &self.layout, &mut self.acc, SamplePoint::new(x, y, z))
    }

    /// Ingest a batch of samples, skipping invalid ones.
    pub fn add_points<I>(&mut self, points: I) -> IngestSummary
    where
        I: IntoIterator<Item = SamplePoint>,
    {
        let summary = ingest(&self.params, &self.layout, &mut self.acc, points);
        report(&summary);
        summary
    }

    /// Ingest a batch of samples on the rayon pool.
    ///
    /// Each worker accumulates its shard into a private grid; the partial
    /// grids are then merged, so no cell is ever written concurrently.
    /// Private grids together stay within [`PARALLEL_CELL_BUDGET`] cells; when
    /// fewer than two fit, the batch is ingested sequentially instead.
    #[cfg(feature = "parallel")]
    pub fn add_points_par(&mut self, points: &[SamplePoint]) -> IngestSummary {
        use rayon::prelude::*;

        if points.is_empty() {
            return IngestSummary::default();
        }

        let cells = self.params.width * self.params.height;
        let shards = shard_count(cells, rayon::current_num_threads());
        if shards < 2 {
            debug!("Grid of {} cells too large for private shards, ingesting sequentially", cells);
            return self.add_points(points.iter().copied());
        }

        let shard_len = points.len().div_ceil(shards).max(1024);
        let (params, layout) = (&self.params, &self.layout);

        let merged = points
            .par_chunks(shard_len)
            .map(|shard| {
                let mut acc = Accumulators::new(params.width, params.height, &params.output_types);
                let summary = ingest(params, layout, &mut acc, shard.iter().copied());
                (acc, summary)
            })
            .reduce_with(|(mut acc, summary), (other, other_summary)| {
                acc.merge(&other);
                (acc, summary + other_summary)
            });

        let summary = match merged {
            Some((acc, summary)) => {
                self.acc.merge(&acc);
                summary
            }
            None => IngestSummary::default(),
        };
        report(&summary);
        summary
    }

    /// Turn the running accumulators into output bands.
    ///
    /// Order matters: standard deviations and IDW values of populated cells
    /// are normalized first, then empty cells are either estimated from
    /// their window (when `window_size > 0`) or set to no-data.
    pub fn finalize(self) -> GriddedBands {
        let Grid {
            params,
            layout,
            mut acc,
        } = self;

        acc.normalize();
        let (mut count, mut stats) = acc.into_bands(&params.output_types);

        let populated = count.mapv(|n| n > 0.0);
        let estimated = if params.window_size > 0 {
            window_fill(&populated, &mut stats, params.window_size, params.no_data)
        } else {
            fill_no_data(&populated, &mut stats, params.no_data);
            Array2::from_elem(populated.dim(), false)
        };

        let populated_cells = populated.iter().filter(|&&p| p).count();
        let estimated_cells = estimated.iter().filter(|&&e| e).count();
        debug!(
            "Finalized {} populated, {} estimated, {} no-data cells",
            populated_cells,
            estimated_cells,
            populated.len() - populated_cells - estimated_cells
        );

        let mut bands = Vec::with_capacity(params.output_types.len());
        if params.output_types.contains(Statistic::Count) {
            // Estimated cells still received no samples and keep their 0
            Zip::from(&mut count)
                .and(&populated)
                .and(&estimated)
                .for_each(|n, &p, &e| {
                    if !p && !e {
                        *n = params.no_data;
                    }
                });
            bands.push(Band::new(Statistic::Count, count));
        }
        bands.extend(stats);

        GriddedBands::new(
            layout.width(),
            layout.height(),
            params.no_data,
            params.transform(),
            bands,
        )
    }
}

/// Cells that parallel ingestion may allocate across all private shards
pub const PARALLEL_CELL_BUDGET: usize = 1 << 25;

/// Number of private shards for a grid of `cells`: one per thread, but never
/// more than the cell budget holds.
#[cfg(feature = "parallel")]
fn shard_count(cells: usize, threads: usize) -> usize {
    (PARALLEL_CELL_BUDGET / cells.max(1)).min(threads)
}

/// Validate a sample and fold it into every cell within radius
fn deposit(
    params: &GridParams,
    layout: &CellLayout,
    acc: &mut Accumulators,
    point: SamplePoint,
) -> Result<()> {
    if !point.is_finite() {
        return Err(Error::InvalidSample {
            x: point.x,
            y: point.y,
            z: point.z,
        });
    }

    let x = point.x - params.origin_x;
    let y = point.y - params.origin_y;
    for_each_in_radius(layout, x, y, params.radius, |i, j, dist| {
        acc.update(i, j, point.z, dist);
    });
    Ok(())
}

fn ingest<I>(
    params: &GridParams,
    layout: &CellLayout,
    acc: &mut Accumulators,
    points: I,
) -> IngestSummary
where
    I: IntoIterator<Item = SamplePoint>,
{
    let mut summary = IngestSummary::default();
    for point in points {
        match deposit(params, layout, acc, point) {
            Ok(()) => summary.accepted += 1,
            Err(e) => {
                trace!("Skipping sample: {}", e);
                summary.rejected += 1;
            }
        }
    }
    summary
}

fn report(summary: &IngestSummary) {
    if summary.rejected > 0 {
        warn!(
            "Skipped {} non-finite sample(s), ingested {}",
            summary.rejected, summary.accepted
        );
    } else {
        debug!("Ingested {} sample(s)", summary.accepted);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gridding::OutputTypes;
    use approx::assert_relative_eq;

    fn params(width: usize, height: usize, radius: f64, stats: &[Statistic]) -> GridParams {
        GridParams {
            width,
            height,
            edge_length: 1.0,
            radius,
            no_data: -9999.0,
            output_types: stats.iter().copied().collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_new_rejects_bad_params() {
        assert!(matches!(
            Grid::new(params(0, 3, 1.0, &[Statistic::Count])),
            Err(Error::InvalidConfiguration { name: "width", .. })
        ));
        assert!(matches!(
            Grid::new(params(3, 0, 1.0, &[Statistic::Count])),
            Err(Error::InvalidConfiguration { name: "height", .. })
        ));
        assert!(matches!(
            Grid::new(params(3, 3, -1.0, &[Statistic::Count])),
            Err(Error::InvalidConfiguration { name: "radius", .. })
        ));
    }

    #[test]
    fn test_num_bands() {
        let grid = Grid::new(params(2, 2, 1.0, &[Statistic::Min, Statistic::StdDev])).unwrap();
        assert_eq!(grid.num_bands(), 2);
        assert_eq!(grid.finalize().num_bands(), 2);

        let grid = Grid::new(GridParams::default()).unwrap();
        assert_eq!(grid.num_bands(), 6);
    }

    #[test]
    fn test_invalid_sample_rejected_without_side_effects() {
        let mut grid = Grid::new(params(3, 3, 2.0, &[Statistic::Count])).unwrap();
        let err = grid.add_point(f64::NAN, 1.0, 1.0).unwrap_err();
        assert!(matches!(err, Error::InvalidSample { .. }));
        assert!(grid.add_point(1.0, 1.0, f64::INFINITY).is_err());
        assert_eq!(grid.counts().sum(), 0.0);
    }

    #[test]
    fn test_add_points_summary() {
        let mut grid = Grid::new(params(3, 3, 0.9, &[Statistic::Count])).unwrap();
        let summary = grid.add_points(vec![
            SamplePoint::new(0.5, 0.5, 1.0),
            SamplePoint::new(f64::NAN, 0.5, 1.0),
            SamplePoint::new(2.5, 2.5, 1.0),
        ]);
        assert_eq!(summary, IngestSummary { accepted: 2, rejected: 1 });
        assert_eq!(grid.counts()[(2, 0)], 1.0);
        assert_eq!(grid.counts()[(0, 2)], 1.0);
    }

    #[test]
    fn test_far_sample_with_huge_radius() {
        let mut grid = Grid::new(params(4, 4, 1e30, &[Statistic::Count, Statistic::Mean])).unwrap();
        grid.add_point(2.0, -1e25, 1.0).unwrap();
        grid.add_point(1e25, 2.0, 3.0).unwrap();
        assert!(grid.counts().iter().all(|&n| n == 2.0));

        let bands = grid.finalize();
        assert!(bands.data(Statistic::Mean).unwrap().iter().all(|&m| m == 2.0));
    }

    #[test]
    fn test_origin_offsets_samples() {
        let mut p = params(2, 2, 0.6, &[Statistic::Count]);
        p.origin_x = 1000.0;
        p.origin_y = 500.0;
        let mut grid = Grid::new(p).unwrap();

        // Center of the top-right cell
        grid.add_point(1001.5, 501.5, 3.0).unwrap();
        assert_eq!(grid.counts()[(0, 1)], 1.0);
        assert_eq!(grid.counts().sum(), 1.0);
    }

    #[test]
    fn test_count_band_of_empty_cells() {
        let mut grid = Grid::new(params(3, 1, 0.6, &[Statistic::Count, Statistic::Mean])).unwrap();
        grid.add_point(0.5, 0.5, 2.0).unwrap();
        let bands = grid.finalize();
        assert_eq!(bands.data(Statistic::Count).unwrap(), &[1.0, -9999.0, -9999.0]);
        assert_eq!(bands.data(Statistic::Mean).unwrap(), &[2.0, -9999.0, -9999.0]);

        let mut p = params(3, 1, 0.6, &[Statistic::Count, Statistic::Mean]);
        p.window_size = 1;
        let mut grid = Grid::new(p).unwrap();
        grid.add_point(0.5, 0.5, 2.0).unwrap();
        let bands = grid.finalize();
        assert_eq!(bands.data(Statistic::Count).unwrap(), &[1.0, 0.0, -9999.0]);
        assert_eq!(bands.data(Statistic::Mean).unwrap(), &[2.0, 2.0, -9999.0]);
    }

    #[test]
    fn test_stdev_only_grid() {
        let mut grid = Grid::new(params(1, 1, 5.0, &[Statistic::StdDev])).unwrap();
        for z in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            grid.add_point(0.5, 0.5, z).unwrap();
        }
        let bands = grid.finalize();
        assert!(bands.data(Statistic::Mean).is_none());
        assert_relative_eq!(bands.data(Statistic::StdDev).unwrap()[0], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_raster_export() {
        let mut p = params(3, 2, 0.6, &[Statistic::Max]);
        p.origin_x = 10.0;
        p.origin_y = 20.0;
        p.edge_length = 2.0;
        p.radius = 1.0;
        let mut grid = Grid::new(p).unwrap();
        grid.add_point(13.0, 23.0, 7.5).unwrap();

        let bands = grid.finalize();
        let raster = bands.raster(Statistic::Max).unwrap();
        assert_eq!(raster.shape(), (2, 3));
        assert_eq!(raster.get(0, 1).unwrap(), 7.5);
        assert_eq!(raster.nodata(), Some(-9999.0));
        assert_eq!(raster.bounds(), (10.0, 20.0, 16.0, 24.0));
        assert_eq!(raster.cell_center(0, 1), (13.0, 23.0));
        assert_eq!(raster.statistics().valid_count, 1);
        assert!(bands.raster(Statistic::Min).is_none());
    }

    #[test]
    fn test_bands_iterate_in_order() {
        let grid = Grid::new(GridParams {
            width: 2,
            height: 2,
            output_types: OutputTypes::all(),
            ..Default::default()
        })
        .unwrap();
        let bands = grid.finalize();
        let names: Vec<_> = bands.bands().map(|(s, data)| (s.name(), data.len())).collect();
        assert_eq!(
            names,
            vec![("count", 4), ("min", 4), ("max", 4), ("mean", 4), ("idw", 4), ("stdev", 4)]
        );
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_shard_count_respects_cell_budget() {
        assert_eq!(shard_count(100 * 100, 8), 8);
        assert_eq!(shard_count(PARALLEL_CELL_BUDGET / 3, 8), 3);
        assert_eq!(shard_count(PARALLEL_CELL_BUDGET, 8), 1);
        assert_eq!(shard_count(PARALLEL_CELL_BUDGET * 4, 16), 0);
        assert_eq!(shard_count(10, 1), 1);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_ingestion_single_thread_pool() {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(1).build().unwrap();
        let mut grid = Grid::new(params(3, 3, 0.9, &[Statistic::Count])).unwrap();
        let points = vec![SamplePoint::new(0.5, 0.5, 1.0), SamplePoint::new(f64::NAN, 0.5, 1.0)];

        let summary = pool.install(|| grid.add_points_par(&points));
        assert_eq!(summary, IngestSummary { accepted: 1, rejected: 1 });
        assert_eq!(grid.counts()[(2, 0)], 1.0);
        assert_eq!(grid.params().width, 3);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_ingestion_matches_sequential() {
        let p = GridParams {
            width: 20,
            height: 15,
            edge_length: 1.0,
            radius: 2.5,
            window_size: 2,
            ..Default::default()
        };

        let points: Vec<SamplePoint> = (0..5000)
            .map(|k| {
                let t = k as f64;
                SamplePoint::new(
                    (t * 0.618_033_988_75).fract() * 14.0,
                    (t * 0.414_213_562_37).fract() * 15.0,
                    (t * 0.1).sin() * 50.0,
                )
            })
            .collect();

        let mut sequential = Grid::new(p.clone()).unwrap();
        sequential.add_points(points.iter().copied());
        let mut parallel = Grid::new(p).unwrap();
        let summary = parallel.add_points_par(&points);
        assert_eq!(summary.accepted, 5000);

        let (a, b) = (sequential.finalize(), parallel.finalize());
        for stat in Statistic::ALL {
            let (a, b) = (a.data(stat).unwrap(), b.data(stat).unwrap());
            for (x, y) in a.iter().zip(b) {
                assert_relative_eq!(*x, *y, epsilon = 1e-8, max_relative = 1e-9);
            }
        }
    }
}
