//! CLI for computing the Voronoi diagram of a set of planar sites.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

use clap::{ArgAction, Parser};
use log::{debug, info};

use fortune_voronoi::io::{read_sites_auto, write_diagram_json};
use fortune_voronoi::{BoundingBox, DiagramBuilder, SweepConfig, VoronoiError};

#[derive(Parser)]
#[command(name = "fortune-voronoi")]
#[command(about = "Compute the Voronoi diagram of planar sites with Fortune's sweep")]
#[command(
    long_about = "Computes the Voronoi diagram of a set of planar sites, clipped to a \
    bounding rectangle, and writes its vertices, edges and cells as JSON.\n\n\
    Sites are read as `x y` or `id x y` lines (`#` starts a comment), or as a JSON array of \
    {\"id\", \"x\", \"y\"} objects."
)]
struct Cli {
    /// Input file. Reads from stdin if not specified
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output JSON file. Writes to stdout if not specified
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Clipping rectangle. Defaults to the bounding box of the sites grown by --margin
    #[arg(long, num_args = 4, value_names = ["XMIN", "YMIN", "XMAX", "YMAX"], allow_negative_numbers = true)]
    bounds: Option<Vec<f64>>,

    /// Margin around the sites when --bounds is not given
    #[arg(long, default_value_t = 1.0)]
    margin: f64,

    /// Sine of the smallest turn through three sites that still counts as a circle
    #[arg(long)]
    collinear_tolerance: Option<f64>,

    /// Distance tolerance, relative to the diagonal of the rectangle
    #[arg(long)]
    vertex_tolerance: Option<f64>,

    /// JSON file with the sweep configuration. Other flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// Increase verbosity (-v: debug, -vv: trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Reduce verbosity to warnings only
    #[arg(short, long)]
    quiet: bool,

    /// Print the running time of the sweep to stderr, even with -q
    #[arg(long)]
    measure_running_time: bool,
}

fn to_io_error(err: VoronoiError) -> io::Error {
    match err {
        VoronoiError::InvalidInput(_) => {
            io::Error::new(io::ErrorKind::InvalidInput, err.to_string())
        }
        VoronoiError::InvariantViolation(_) => io::Error::other(err.to_string()),
    }
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let mut config = match &cli.config {
        Some(path) => {
            let file = BufReader::new(File::open(path)?);
            let config: SweepConfig = serde_json::from_reader(file)?;
            info!("Loaded sweep configuration from {}", path.display());
            config
        }
        None => SweepConfig::default(),
    };
    if let Some(tolerance) = cli.collinear_tolerance {
        config.collinear_tolerance = tolerance;
    }
    if let Some(tolerance) = cli.vertex_tolerance {
        config.vertex_tolerance = tolerance;
    }
    debug!("{config:?}");

    let sites = match &cli.input {
        Some(path) => read_sites_auto(BufReader::new(File::open(path)?))?,
        None => read_sites_auto(io::stdin().lock())?,
    };
    info!("Read {} sites", sites.len());

    let bounds = match cli.bounds.as_deref() {
        Some(&[xmin, ymin, xmax, ymax]) => BoundingBox::new(xmin, ymin, xmax, ymax),
        Some(values) => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("--bounds takes four values, got {}", values.len()),
            ))
        }
        None => BoundingBox::around(&sites, cli.margin).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "no sites to derive the bounds from, pass --bounds",
            )
        })?,
    };
    debug!("Bounds: {bounds:?}");

    let start = Instant::now();
    let diagram = DiagramBuilder::new(bounds)
        .with_config(config)
        .build(&sites)
        .map_err(to_io_error)?;
    let elapsed = start.elapsed();

    let stats = diagram.stats();
    info!(
        "Computed {} vertices, {} edges, {} cells",
        diagram.vertices().len(),
        diagram.edges().len(),
        diagram.cells().len()
    );
    debug!("{stats:?}");
    if !diagram.warnings().is_empty() {
        info!(
            "{} collinear site triples were skipped",
            diagram.warnings().len()
        );
    }

    if cli.measure_running_time {
        eprintln!("Sweep time: {} ms", elapsed.as_millis());
    }

    if let Some(path) = &cli.output {
        let mut file = BufWriter::new(File::create(path)?);
        write_diagram_json(&mut file, &diagram, cli.pretty)?;
        file.flush()?;
    } else {
        let mut stdout = io::stdout().lock();
        write_diagram_json(&mut stdout, &diagram, cli.pretty)?;
        writeln!(stdout)?;
    }

    Ok(())
}
