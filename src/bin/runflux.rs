//! runflux CLI - Command-line interface for runflux
//!
//! Commands:
//! - process: Clean a recording into the enriched table
//! - summary: Overview statistics of the enriched table
//! - series: Chart-ready series for one dashboard panel
//! - schema: Describe the enriched table columns

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use runflux::encoder::TableEncoder;
use runflux::summary::summarize;
use runflux::types::{CleanedActivity, ENRICHED_COLUMNS};
use runflux::{views, ActivityProcessor, CleaningConfig, InputFormat, PipelineError};
use runflux::{PRODUCER_NAME, RUNFLUX_VERSION};

/// runflux - Clean activity recordings into speed, pace and grade series
#[derive(Parser)]
#[command(name = "runflux")]
#[command(author = "Synheart AI Inc")]
#[command(version = RUNFLUX_VERSION)]
#[command(about = "Clean activity recordings into dashboard-ready tables", long_about = None)]
struct Cli {
    /// Verbose logging (debug level unless RUST_LOG is set)
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct InputArgs {
    /// Recording path (use - for stdin together with --input-format)
    input: PathBuf,

    /// Recording format (detected from the extension when omitted)
    #[arg(long)]
    input_format: Option<FormatOpt>,

    /// Cleaning configuration JSON
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the short smoothing window (samples)
    #[arg(long)]
    short_window: Option<usize>,

    /// Override the long smoothing window (samples)
    #[arg(long)]
    long_window: Option<usize>,

    /// Override the IQR fence multiplier
    #[arg(long)]
    iqr_multiplier: Option<f64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean a recording into the enriched table
    Process {
        #[command(flatten)]
        input: InputArgs,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Print overview statistics of the enriched table
    Summary {
        #[command(flatten)]
        input: InputArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Emit the series one dashboard panel plots
    Series {
        #[command(flatten)]
        input: InputArgs,

        /// Panel to extract
        #[arg(value_enum)]
        chart: Chart,
    },

    /// Describe the enriched table
    Schema {
        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatOpt {
    /// FIT activity file
    Fit,
    /// JSON array or NDJSON of raw samples
    Json,
}

impl From<FormatOpt> for InputFormat {
    fn from(opt: FormatOpt) -> Self {
        match opt {
            FormatOpt::Fit => InputFormat::Fit,
            FormatOpt::Json => InputFormat::Json,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one enriched row per line)
    Ndjson,
    /// Row-oriented table as compact JSON
    Json,
    /// Row-oriented table as pretty-printed JSON
    JsonPretty,
    /// Column-oriented table as pretty-printed JSON
    Columns,
}

#[derive(Clone, Copy, ValueEnum)]
enum Chart {
    /// Route polyline and map center
    Route,
    /// Speed over distance
    Speed,
    /// Elevation and inclination over time
    Elevation,
    /// Cadence distribution
    Cadence,
    /// Speed (km/h) distribution
    SpeedDistribution,
    /// Pace and heart rate with reference bands
    PaceHr,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn run(cli: Cli) -> Result<(), RunfluxCliError> {
    match cli.command {
        Commands::Process {
            input,
            output,
            output_format,
        } => cmd_process(&input, &output, &output_format),
        Commands::Summary { input, json } => cmd_summary(&input, json),
        Commands::Series { input, chart } => cmd_series(&input, chart),
        Commands::Schema { json_schema } => cmd_schema(json_schema),
    }
}

fn cmd_process(
    args: &InputArgs,
    output: &Path,
    output_format: &OutputFormat,
) -> Result<(), RunfluxCliError> {
    let (activity, format) = load_activity(args)?;
    let encoder = TableEncoder::new();

    let output_data = match output_format {
        OutputFormat::Ndjson => encoder.encode_ndjson(&activity)?,
        OutputFormat::Json => serde_json::to_string(&encoder.encode(&activity, format))?,
        OutputFormat::JsonPretty => encoder.encode_to_json(&activity, format)?,
        OutputFormat::Columns => {
            serde_json::to_string_pretty(&encoder.encode_columns(&activity, format))?
        }
    };

    if output.to_string_lossy() == "-" {
        println!("{}", output_data.trim_end());
    } else {
        fs::write(output, output_data)?;
        tracing::info!(
            path = %output.display(),
            rows = activity.samples.len(),
            "wrote enriched table"
        );
    }

    Ok(())
}

fn cmd_summary(args: &InputArgs, json: bool) -> Result<(), RunfluxCliError> {
    let (activity, _) = load_activity(args)?;
    let summaries = summarize(&activity.samples);

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    println!("Activity Summary");
    println!("================");
    println!("Raw samples:      {}", activity.report.raw_samples);
    println!("Enriched samples: {}", activity.report.enriched_samples);
    println!("Diagnostics:      {}", activity.report.diagnostics.len());
    println!();
    println!(
        "{:<18} {:>6} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
    );
    for s in &summaries {
        println!(
            "{:<18} {:>6} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
            s.column,
            s.count,
            fmt_stat(s.mean),
            fmt_stat(s.std),
            fmt_stat(s.min),
            fmt_stat(s.p25),
            fmt_stat(s.p50),
            fmt_stat(s.p75),
            fmt_stat(s.max)
        );
    }

    Ok(())
}

fn cmd_series(args: &InputArgs, chart: Chart) -> Result<(), RunfluxCliError> {
    let (activity, _) = load_activity(args)?;
    let samples = &activity.samples;

    let series = match chart {
        Chart::Route => match views::route(samples) {
            Some(route) => serde_json::to_value(route)?,
            None => {
                tracing::warn!("recording carries no position data");
                serde_json::Value::Null
            }
        },
        Chart::Speed => serde_json::to_value(views::speed_over_distance(samples))?,
        Chart::Elevation => serde_json::to_value(views::elevation_profile(samples))?,
        Chart::Cadence => serde_json::to_value(views::cadence_distribution(samples))?,
        Chart::SpeedDistribution => serde_json::to_value(views::speed_distribution(samples))?,
        Chart::PaceHr => serde_json::to_value(views::pace_heart_rate(samples))?,
    };

    println!("{}", serde_json::to_string_pretty(&series)?);
    Ok(())
}

fn cmd_schema(json_schema: bool) -> Result<(), RunfluxCliError> {
    if json_schema {
        println!("{}", get_output_json_schema());
        return Ok(());
    }

    println!("Enriched table ({} {})", PRODUCER_NAME, RUNFLUX_VERSION);
    println!();
    for column in ENRICHED_COLUMNS {
        println!("- {:<17} {}", column, column_description(column));
    }
    println!();
    println!("Rows are a subset of the recording's samples, in recording order.");
    println!("The first sample never survives: it has no predecessor to derive speed from.");

    Ok(())
}

// Helper functions

fn load_activity(args: &InputArgs) -> Result<(CleanedActivity, InputFormat), RunfluxCliError> {
    let stdin = args.input.to_string_lossy() == "-";
    let format = match (args.input_format, stdin) {
        (Some(opt), _) => InputFormat::from(opt),
        (None, true) => return Err(RunfluxCliError::FormatRequired),
        (None, false) => InputFormat::from_path(&args.input)?,
    };

    let bytes = if stdin {
        let mut buffer = Vec::new();
        io::stdin().read_to_end(&mut buffer)?;
        buffer
    } else {
        fs::read(&args.input)?
    };

    let processor = ActivityProcessor::with_config(load_config(args)?)?;
    let activity = processor.process_bytes(&bytes, format)?;

    if activity.is_empty() {
        tracing::warn!("every sample was pruned during cleaning");
    }

    Ok((activity, format))
}

fn load_config(args: &InputArgs) -> Result<CleaningConfig, RunfluxCliError> {
    let mut config = match &args.config {
        Some(path) => CleaningConfig::from_json(&fs::read_to_string(path)?)?,
        None => CleaningConfig::default(),
    };

    if let Some(w) = args.short_window {
        config.short_window = w;
    }
    if let Some(w) = args.long_window {
        config.long_window = w;
    }
    if let Some(k) = args.iqr_multiplier {
        config.iqr_multiplier = k;
    }

    Ok(config)
}

fn fmt_stat(value: Option<f64>) -> String {
    value
        .map(|v| format!("{v:.3}"))
        .unwrap_or_else(|| "-".to_string())
}

fn column_description(column: &str) -> &'static str {
    match column {
        "timestamp" => "sample instant (UTC, RFC 3339)",
        "distance" => "cumulative distance (m)",
        "altitude" => "altitude (m)",
        "heart_rate" => "heart rate (bpm)",
        "cadence" => "cadence (steps/min)",
        "position_lat" => "latitude (degrees, nullable)",
        "position_long" => "longitude (degrees, nullable)",
        "speed_calculated" => "instantaneous speed after local outlier suppression (m/s)",
        "speed_kmh" => "speed_calculated in km/h",
        "speed_smoothed" => "long-window smoothed speed (km/h, >= 0)",
        "pace_min_km" => "minutes per km (null when speed_smoothed is 0)",
        "distance_km" => "cumulative distance (km)",
        "inclination" => "altitude change per km since previous row (m/km, 0 on first row)",
        _ => "",
    }
}

fn get_output_json_schema() -> String {
    let number = serde_json::json!({ "type": "number" });
    let nullable = serde_json::json!({ "type": ["number", "null"] });
    let mut properties = serde_json::Map::new();
    for column in ENRICHED_COLUMNS {
        let schema = match column {
            "timestamp" => serde_json::json!({ "type": "string", "format": "date-time" }),
            "position_lat" | "position_long" | "pace_min_km" => nullable.clone(),
            _ => number.clone(),
        };
        properties.insert(column.to_string(), schema);
    }

    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "runflux.enriched_table",
        "description": "runflux enriched activity table",
        "type": "object",
        "required": ["producer", "provenance", "report", "columns", "rows"],
        "properties": {
            "producer": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "version": { "type": "string" },
                    "instance_id": { "type": "string" }
                }
            },
            "provenance": {
                "type": "object",
                "properties": {
                    "source_format": { "type": "string" },
                    "computed_at_utc": { "type": "string" }
                }
            },
            "report": {
                "type": "object",
                "properties": {
                    "raw_samples": { "type": "integer" },
                    "enriched_samples": { "type": "integer" },
                    "diagnostics": { "type": "array", "items": { "type": "object" } }
                }
            },
            "columns": { "type": "array", "items": { "type": "string" } },
            "rows": {
                "type": "array",
                "items": { "type": "object", "properties": properties }
            }
        }
    })
    .to_string()
}

// Error types

#[derive(Debug)]
enum RunfluxCliError {
    Io(io::Error),
    Pipeline(PipelineError),
    Json(serde_json::Error),
    FormatRequired,
}

impl From<io::Error> for RunfluxCliError {
    fn from(e: io::Error) -> Self {
        RunfluxCliError::Io(e)
    }
}

impl From<PipelineError> for RunfluxCliError {
    fn from(e: PipelineError) -> Self {
        RunfluxCliError::Pipeline(e)
    }
}

impl From<serde_json::Error> for RunfluxCliError {
    fn from(e: serde_json::Error) -> Self {
        RunfluxCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<RunfluxCliError> for CliError {
    fn from(e: RunfluxCliError) -> Self {
        match e {
            RunfluxCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            RunfluxCliError::Pipeline(e) if e.is_unsupported_recording() => CliError {
                code: "UNSUPPORTED_RECORDING".to_string(),
                message: e.to_string(),
                hint: Some(
                    "The recording must carry timestamp and distance on every sample".to_string(),
                ),
            },
            RunfluxCliError::Pipeline(PipelineError::InvalidConfig(msg)) => CliError {
                code: "INVALID_CONFIG".to_string(),
                message: msg,
                hint: Some("Windows must be at least 1 sample".to_string()),
            },
            RunfluxCliError::Pipeline(e) => CliError {
                code: "PIPELINE_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            RunfluxCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            RunfluxCliError::FormatRequired => CliError {
                code: "FORMAT_REQUIRED".to_string(),
                message: "Cannot detect the format of stdin input".to_string(),
                hint: Some("Pass --input-format fit or --input-format json".to_string()),
            },
        }
    }
}
