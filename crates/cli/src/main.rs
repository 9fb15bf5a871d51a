//! ptgrid CLI - grid scattered XYZ samples into per-cell statistics

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{Level, debug, info};
use tracing_subscriber::FmtSubscriber;

use ptgrid_algorithms::gridding::{
    Bounds, Grid, GridParams, GriddedBands, OutputTypes, SamplePoint,
};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "ptgrid")]
#[command(author, version, about = "Grid scattered points into raster statistics", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grid an XYZ point file and print per-band statistics
    Grid {
        /// Input file of `x y z` lines, or `-` for stdin
        input: String,
        /// Cell edge length in world units
        #[arg(short, long)]
        resolution: Option<f64>,
        /// Search radius (default: resolution * sqrt(2))
        #[arg(long)]
        radius: Option<f64>,
        /// Statistics to compute: count, min, max, mean, idw, stdev, all
        #[arg(short = 't', long = "output-type", value_delimiter = ',')]
        output_types: Vec<String>,
        /// Gap-fill window in cells (0 disables)
        #[arg(short, long)]
        window_size: Option<usize>,
        /// Value for cells without an estimate
        #[arg(short, long, allow_hyphen_values = true)]
        nodata: Option<f64>,
        /// Grid extent as minx,miny,maxx,maxy (default: extent of the data)
        #[arg(short, long, allow_hyphen_values = true)]
        bounds: Option<String>,
        /// JSON file with grid parameters; flags override its fields
        #[arg(short, long)]
        params: Option<PathBuf>,
    },
}

/// Flag overrides applied on top of the base parameters
#[derive(Debug, Default)]
struct Overrides {
    resolution: Option<f64>,
    radius: Option<f64>,
    output_types: Vec<String>,
    window_size: Option<usize>,
    nodata: Option<f64>,
    bounds: Option<Bounds>,
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install log subscriber")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Parse `x y z` samples, one per line. Fields may be separated by
/// whitespace or commas; extra columns are ignored.
fn parse_points<R: BufRead>(reader: R) -> Result<Vec<SamplePoint>> {
    let mut points = Vec::new();
    for (n, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line {}", n + 1))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|f| !f.is_empty());
        let mut coord = |axis: &str| -> Result<f64> {
            let field = fields
                .next()
                .with_context(|| format!("Line {}: missing {} value", n + 1, axis))?;
            field
                .parse::<f64>()
                .with_context(|| format!("Line {}: invalid {} value '{}'", n + 1, axis, field))
        };
        let (x, y, z) = (coord("x")?, coord("y")?, coord("z")?);
        points.push(SamplePoint::new(x, y, z));
    }
    Ok(points)
}

fn read_points(input: &str) -> Result<Vec<SamplePoint>> {
    let pb = spinner("Reading points...");
    let points = if input == "-" {
        parse_points(io::stdin().lock()).context("Failed to read points from stdin")?
    } else {
        let file = File::open(input).with_context(|| format!("Failed to open {}", input))?;
        parse_points(BufReader::new(file)).with_context(|| format!("Failed to parse {}", input))?
    };
    pb.finish_and_clear();
    info!("Input: {} points", points.len());
    Ok(points)
}

fn parse_bounds(s: &str) -> Result<Bounds> {
    let values: Vec<f64> = s
        .split(',')
        .map(|v| {
            v.trim()
                .parse::<f64>()
                .with_context(|| format!("Invalid bounds value '{}'", v.trim()))
        })
        .collect::<Result<_>>()?;
    match values.as_slice() {
        &[min_x, min_y, max_x, max_y] => Ok(Bounds::new(min_x, min_y, max_x, max_y)),
        _ => bail!("Bounds must be minx,miny,maxx,maxy, got '{}'", s),
    }
}

fn load_params(path: &Path) -> Result<GridParams> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse grid parameters from {}", path.display()))
}

/// Merge the base parameters with flag overrides. A resolution lays the grid
/// over the given bounds, or over the extent of `points` when none are given.
fn resolve_params(
    base: Option<GridParams>,
    overrides: Overrides,
    points: &[SamplePoint],
) -> Result<GridParams> {
    let has_base = base.is_some();
    let mut params = base.unwrap_or_default();

    if let Some(resolution) = overrides.resolution {
        let bounds = match overrides.bounds {
            Some(bounds) => bounds,
            None => Bounds::from_points(points)
                .context("No finite points to derive the grid extent from")?,
        };
        let geometry = GridParams::from_bounds(bounds, resolution)?;
        params.width = geometry.width;
        params.height = geometry.height;
        params.edge_length = geometry.edge_length;
        params.radius = geometry.radius;
        params.origin_x = geometry.origin_x;
        params.origin_y = geometry.origin_y;
    } else if !has_base {
        bail!("Either --resolution or --params is required");
    } else if overrides.bounds.is_some() {
        bail!("--bounds requires --resolution");
    }

    if let Some(radius) = overrides.radius {
        params.radius = radius;
    }
    if !overrides.output_types.is_empty() {
        params.output_types = OutputTypes::parse_list(&overrides.output_types)?;
    }
    if let Some(window_size) = overrides.window_size {
        params.window_size = window_size;
    }
    if let Some(nodata) = overrides.nodata {
        params.no_data = nodata;
    }

    params.validate()?;
    Ok(params)
}

fn print_summary(bands: &GriddedBands) {
    let (min_x, min_y, max_x, max_y) = bands.transform().bounds(bands.width(), bands.height());
    println!(
        "Grid: {} x {} ({} cells)",
        bands.width(),
        bands.height(),
        bands.width() * bands.height()
    );
    println!("Cell size: {}", bands.transform().cell_size());
    println!(
        "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
        min_x, min_y, max_x, max_y
    );
    println!("NoData: {}", bands.no_data());

    for (statistic, _) in bands.bands() {
        let Some(raster) = bands.raster(statistic) else {
            continue;
        };
        let stats = raster.statistics();
        println!("\nBand {}:", statistic);
        if let Some(min) = stats.min {
            println!("  Min: {:.4}", min);
        }
        if let Some(max) = stats.max {
            println!("  Max: {:.4}", max);
        }
        if let Some(mean) = stats.mean {
            println!("  Mean: {:.4}", mean);
        }
        println!("  Valid cells: {}", stats.valid_count);
        println!("  NoData cells: {}", stats.nodata_count);
    }
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        Commands::Grid {
            input,
            resolution,
            radius,
            output_types,
            window_size,
            nodata,
            bounds,
            params,
        } => {
            let base = params.as_deref().map(load_params).transpose()?;
            let bounds = bounds.as_deref().map(parse_bounds).transpose()?;
            let points = read_points(&input)?;

            let overrides = Overrides {
                resolution,
                radius,
                output_types,
                window_size,
                nodata,
                bounds,
            };
            let params = resolve_params(base, overrides, &points)?;

            let start = Instant::now();
            let mut grid = Grid::new(params)?;
            debug!("Parameters: {:?}", grid.params());

            let pb = spinner("Gridding points...");
            let summary = grid.add_points_par(&points);
            pb.set_message("Finalizing bands...");
            let bands = grid.finalize();
            pb.finish_and_clear();

            let elapsed = start.elapsed();
            info!(
                "Gridded {} points ({} skipped) into {} band(s)",
                summary.accepted,
                summary.rejected,
                bands.num_bands()
            );

            print_summary(&bands);
            println!("\n  Processing time: {:.2?}", elapsed);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ptgrid_algorithms::gridding::Statistic;
    use std::io::{Cursor, Write};

    #[test]
    fn test_parse_points_separators_and_comments() {
        let input = "# x y z\n\n1 2 3\n4.5,5.5,6.5\n  7\t8  9 120\n";
        let points = parse_points(Cursor::new(input)).unwrap();
        assert_eq!(
            points,
            vec![
                SamplePoint::new(1.0, 2.0, 3.0),
                SamplePoint::new(4.5, 5.5, 6.5),
                SamplePoint::new(7.0, 8.0, 9.0),
            ]
        );
    }

    #[test]
    fn test_parse_points_reports_bad_line() {
        let err = parse_points(Cursor::new("1 2 3\n1 2\n")).unwrap_err();
        assert!(err.to_string().contains("Line 2"), "{}", err);

        let err = parse_points(Cursor::new("1 two 3\n")).unwrap_err();
        assert!(err.to_string().contains("invalid y"), "{}", err);
    }

    #[test]
    fn test_read_points_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "0.5 0.5 10").unwrap();
        writeln!(file, "1.5 0.5 20").unwrap();
        let points = read_points(file.path().to_str().unwrap()).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].z, 20.0);

        assert!(read_points("/nonexistent/points.xyz").is_err());
    }

    #[test]
    fn test_parse_bounds() {
        assert_eq!(
            parse_bounds("-10, 0.5,20,30").unwrap(),
            Bounds::new(-10.0, 0.5, 20.0, 30.0)
        );
        assert!(parse_bounds("1,2,3").is_err());
        assert!(parse_bounds("a,b,c,d").is_err());
    }

    #[test]
    fn test_resolve_params_from_data_extent() {
        let points = [
            SamplePoint::new(10.0, 20.0, 1.0),
            SamplePoint::new(14.0, 22.0, 2.0),
        ];
        let overrides = Overrides {
            resolution: Some(2.0),
            output_types: vec!["mean".into(), "idw".into()],
            window_size: Some(2),
            ..Default::default()
        };
        let params = resolve_params(None, overrides, &points).unwrap();
        assert_eq!((params.width, params.height), (3, 2));
        assert_eq!((params.origin_x, params.origin_y), (10.0, 20.0));
        assert_eq!(params.window_size, 2);
        assert!(params.output_types.contains(Statistic::Idw));
        assert!(!params.output_types.contains(Statistic::Count));
    }

    #[test]
    fn test_resolve_params_requires_geometry() {
        assert!(resolve_params(None, Overrides::default(), &[]).is_err());

        let overrides = Overrides {
            resolution: Some(1.0),
            ..Default::default()
        };
        assert!(resolve_params(None, overrides, &[]).is_err());
    }

    #[test]
    fn test_params_file_with_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"width": 5, "height": 4, "radius": 0.5, "output_types": ["count"]}}"#
        )
        .unwrap();

        let base = load_params(file.path()).unwrap();
        let overrides = Overrides {
            nodata: Some(-1.0),
            radius: Some(0.75),
            ..Default::default()
        };
        let params = resolve_params(Some(base), overrides, &[]).unwrap();
        assert_eq!((params.width, params.height), (5, 4));
        assert_eq!(params.radius, 0.75);
        assert_eq!(params.no_data, -1.0);
        assert_eq!(params.output_types.len(), 1);
    }

    #[test]
    fn test_cli_parses_grid_command() {
        let cli = Cli::try_parse_from([
            "ptgrid",
            "grid",
            "points.xyz",
            "--resolution",
            "0.5",
            "-t",
            "mean,stdev",
            "--nodata",
            "-9999",
            "--bounds",
            "-5,-5,5,5",
        ])
        .unwrap();
        let Commands::Grid {
            resolution,
            output_types,
            nodata,
            bounds,
            ..
        } = cli.command;
        assert_eq!(resolution, Some(0.5));
        assert_eq!(output_types, vec!["mean", "stdev"]);
        assert_eq!(nodata, Some(-9999.0));
        assert_eq!(bounds.as_deref(), Some("-5,-5,5,5"));
    }
}
