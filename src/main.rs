//! CLI entry point for macroflow.
//!
//! Loads vehicle trajectories from a file or URL, aggregates them over a
//! space-time grid and exports macrodata, heatmap matrices or section
//! summaries.

use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use macroflow::analyzers::sections::summarize_sections;
use macroflow::engine::{GridSpec, Metric, VehicleIndex};
use macroflow::{
    AggregateTable, CancellationToken, GridError, GridParams, TrajectoryTable, compute_with_cancel,
    fetch::load_source,
    output::{print_pretty, write_json, write_pivot, write_table},
    parser::{Delimiter, ParseOptions, parse_trajectories},
};
use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "macroflow")]
#[command(about = "Aggregate vehicle trajectories into space-time traffic metrics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the macrodata table (speed, density, flow per cell)
    Aggregate {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        grid: GridArgs,

        /// CSV file to write macrodata to
        #[arg(short, long, default_value = "static/macrodata.csv")]
        output: String,

        /// Gzip compress the macrodata CSV
        #[arg(long, default_value_t = false)]
        gzip: bool,

        /// Optional: write per-section summaries as JSON
        #[arg(long)]
        summary: Option<String>,
    },
    /// Write one metric as a space x time matrix for heatmap rendering
    Heatmap {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        grid: GridArgs,

        /// Metric to lay out
        #[arg(short, long, value_enum, default_value_t = MetricArg::AvgSpeed)]
        metric: MetricArg,

        /// CSV file to write the matrix to
        #[arg(short, long, default_value = "static/heatmap.csv")]
        output: String,
    },
    /// Report data extents and the grid shape without aggregating
    Inspect {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        grid: GridArgs,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// Path to file or URL to fetch
    #[arg(value_name = "FILE_OR_URL")]
    source: String,

    /// Field delimiter: a single character, "tab" or "whitespace"
    #[arg(long, default_value = ",")]
    delimiter: String,

    /// Input has no header row
    #[arg(long, default_value_t = false)]
    no_header: bool,
}

#[derive(Args)]
struct GridArgs {
    /// JSON file with binning parameters; flags below override it
    #[arg(short, long)]
    config: Option<String>,

    #[arg(long)]
    vehicle_column: Option<usize>,

    #[arg(long)]
    time_column: Option<usize>,

    #[arg(long)]
    position_column: Option<usize>,

    /// Window width in raw time units
    #[arg(long)]
    time_step: Option<i64>,

    /// Window width in position units
    #[arg(long)]
    space_step: Option<i64>,

    /// Seconds per raw time unit
    #[arg(long)]
    time_scale: Option<f64>,

    /// Abort the aggregation after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[derive(Clone, Copy, ValueEnum)]
enum MetricArg {
    AvgSpeed,
    Density,
    Flow,
}

impl From<MetricArg> for Metric {
    fn from(m: MetricArg) -> Self {
        match m {
            MetricArg::AvgSpeed => Metric::AvgSpeed,
            MetricArg::Density => Metric::Density,
            MetricArg::Flow => Metric::Flow,
        }
    }
}

impl SourceArgs {
    fn parse_options(&self) -> Result<ParseOptions> {
        let delimiter = match self.delimiter.as_str() {
            "whitespace" => Delimiter::Whitespace,
            "tab" => Delimiter::Byte(b'\t'),
            d if d.len() == 1 => Delimiter::Byte(d.as_bytes()[0]),
            d => bail!("unsupported delimiter {:?}", d),
        };
        Ok(ParseOptions {
            delimiter,
            has_header: !self.no_header,
        })
    }

    async fn load(&self) -> Result<TrajectoryTable> {
        let bytes = load_source(&self.source).await?;
        let table = parse_trajectories(&bytes, &self.parse_options()?)?;
        info!(
            rows = table.n_rows(),
            columns = table.n_cols(),
            "Trajectories loaded"
        );
        Ok(table)
    }
}

impl GridArgs {
    fn params(&self) -> Result<GridParams> {
        let mut params = match &self.config {
            Some(path) => GridParams::load(path)?,
            None => GridParams::default(),
        };

        if let Some(v) = self.vehicle_column {
            params.vehicle_column = v;
        }
        if let Some(v) = self.time_column {
            params.time_column = v;
        }
        if let Some(v) = self.position_column {
            params.position_column = v;
        }
        if let Some(v) = self.time_step {
            params.time_step = v;
        }
        if let Some(v) = self.space_step {
            params.space_step = v;
        }
        if let Some(v) = self.time_scale {
            params.time_scale = v;
        }

        params.validate()?;
        Ok(params)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/macroflow.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("macroflow.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Aggregate {
            source,
            grid,
            output,
            gzip,
            summary,
        } => {
            let params = grid.params()?;
            let table = source.load().await?;
            let aggregate = run_engine(table, params, grid.timeout_secs).await?;
            print_pretty(&aggregate);

            write_table(&output, &aggregate, gzip)?;

            if let Some(path) = summary {
                let report = summarize_sections(&aggregate, &params);
                write_json(&path, &report)?;
                info!(path = %path, sections = report.sections.len(), "Section summary written");
            }
        }
        Commands::Heatmap {
            source,
            grid,
            metric,
            output,
        } => {
            let params = grid.params()?;
            let table = source.load().await?;
            let aggregate = run_engine(table, params, grid.timeout_secs).await?;

            write_pivot(&output, &aggregate.pivot(metric.into()))?;
        }
        Commands::Inspect { source, grid } => {
            let params = grid.params()?;
            let table = source.load().await?;
            inspect(&table, &params)?;
        }
    }

    Ok(())
}

/// Runs the engine on the blocking pool; Ctrl+C or the timeout cancel it.
#[tracing::instrument(skip(table))]
async fn run_engine(
    table: TrajectoryTable,
    params: GridParams,
    timeout_secs: Option<u64>,
) -> Result<AggregateTable> {
    let cancel = CancellationToken::new();
    let worker_token = cancel.clone();

    let handle =
        tokio::task::spawn_blocking(move || compute_with_cancel(&table, &params, &worker_token));

    supervise(
        handle,
        cancel,
        timeout_secs.map(Duration::from_secs),
        tokio::signal::ctrl_c(),
    )
    .await
}

/// Waits for the engine task, cancelling it when `timeout` elapses or
/// `interrupt` resolves `Ok`. An `interrupt` error only disables that arm.
async fn supervise<F>(
    mut handle: JoinHandle<Result<AggregateTable, GridError>>,
    cancel: CancellationToken,
    timeout: Option<Duration>,
    interrupt: F,
) -> Result<AggregateTable>
where
    F: Future<Output = std::io::Result<()>>,
{
    let deadline = async {
        match timeout {
            Some(d) => tokio::time::sleep(d).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);
    tokio::pin!(interrupt);
    let mut listening = true;

    loop {
        tokio::select! {
            res = &mut handle => return Ok(res??),
            _ = &mut deadline => {
                warn!(timeout_secs = ?timeout.map(|d| d.as_secs()), "Timeout reached, cancelling aggregation");
                cancel.cancel();
                return Ok(handle.await??);
            }
            res = &mut interrupt, if listening => match res {
                Ok(()) => {
                    warn!("Interrupt received, cancelling aggregation");
                    cancel.cancel();
                    return Ok(handle.await??);
                }
                Err(e) => {
                    warn!(error = %e, "Unable to listen for Ctrl+C, continuing without it");
                    listening = false;
                }
            },
        }
    }
}

/// Logs the extents of the data and the grid `params` would produce.
fn inspect(table: &TrajectoryTable, params: &GridParams) -> Result<()> {
    let points = params.columns().extract(table)?;
    let index = VehicleIndex::build(&points);
    let Some(grid) = GridSpec::derive(&points, params) else {
        bail!("trajectory array is empty");
    };

    let (t_lo, t_hi) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.time), hi.max(p.time))
        });
    let (s_lo, s_hi) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.position), hi.max(p.position))
        });

    info!(
        rows = points.len(),
        vehicles = index.len(),
        time_min = t_lo,
        time_max = t_hi,
        position_min = s_lo,
        position_max = s_hi,
        "Trajectory extents"
    );

    if grid.is_degenerate() {
        warn!(
            time_step = params.time_step,
            space_step = params.space_step,
            "Window larger than data span, aggregation would be empty"
        );
    }

    info!(
        time_bins = grid.num_time_bins,
        space_bins = grid.num_space_bins,
        cells = grid.num_cells(),
        first_start_time = grid.time_min,
        first_start_space = grid.space_min,
        window_area = params.window_area(),
        "Grid shape"
    );

    Ok(())
}
