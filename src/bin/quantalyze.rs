//! Quantalyze CLI - Command-line interface for the Quantalyze scoring engine
//!
//! Commands:
//! - detect: Suggest habit mappings for a CSV export
//! - import: Turn a CSV export into habits and daily logs
//! - score: Daily quality scores (or heatmap levels) for a date range
//! - summary: Dashboard analytics for a reference day

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use quantalyze_core::heatmap::MAX_HEATMAP_WEEKS;
use quantalyze_core::import::{
    auto_map_columns, build_import, ImportBatch, ImportConfig, ParsedSpreadsheetData,
    SpreadsheetFormat,
};
use quantalyze_core::pipeline::{
    generate_scores_for_date_range, ScoreProcessor, DEFAULT_HEATMAP_WEEKS, DEFAULT_TREND_DAYS,
    MAX_TREND_DAYS,
};
use quantalyze_core::{scores_to_heatmap_levels, EngineError, ENGINE_VERSION};

/// Quantalyze - Quality Score engine for personal habit tracking
#[derive(Parser)]
#[command(name = "quantalyze")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Score habit logs and import habit spreadsheets", long_about = None)]
struct Cli {
    /// Log engine decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Suggest a date column and habit mappings for a CSV export
    Detect {
        /// Input CSV path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Date column index, detected from the headers when omitted
        #[arg(long)]
        date_column: Option<usize>,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Import a CSV export into habits and daily logs
    Import {
        /// Input CSV path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Import config JSON; the suggested mapping is used when omitted
        #[arg(long)]
        config: Option<PathBuf>,

        /// Date column index for the suggested mapping
        #[arg(long, conflicts_with = "config")]
        date_column: Option<usize>,

        /// Output format
        #[arg(long, default_value = "json")]
        output_format: OutputFormat,
    },

    /// Daily quality scores for a date range
    Score {
        /// Import batch JSON (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// First day (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,

        /// Last day (YYYY-MM-DD), defaults to today
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Emit heatmap points instead of scores
        #[arg(long)]
        heatmap: bool,

        /// Output format
        #[arg(long, default_value = "json")]
        output_format: OutputFormat,
    },

    /// Dashboard analytics for a reference day
    Summary {
        /// Import batch JSON (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Reference day (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Days on the trend chart
        #[arg(
            long,
            default_value_t = DEFAULT_TREND_DAYS,
            value_parser = clap::value_parser!(u32).range(1..=MAX_TREND_DAYS as i64)
        )]
        trend_days: u32,

        /// Weeks on the heatmap
        #[arg(
            long,
            default_value_t = DEFAULT_HEATMAP_WEEKS,
            value_parser = clap::value_parser!(u32).range(1..=MAX_HEATMAP_WEEKS as i64)
        )]
        heatmap_weeks: u32,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
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
    let default_filter = if verbose {
        "quantalyze_core=debug,quantalyze=debug"
    } else {
        "quantalyze_core=info,quantalyze=info"
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with(fmt::layer().with_writer(io::stderr))
        .init();
}

fn run(cli: Cli) -> Result<(), QuantalyzeCliError> {
    match cli.command {
        Commands::Detect {
            input,
            date_column,
            output_format,
        } => cmd_detect(&input, date_column, &output_format),

        Commands::Import {
            input,
            output,
            config,
            date_column,
            output_format,
        } => cmd_import(&input, &output, config.as_deref(), date_column, &output_format),

        Commands::Score {
            input,
            start,
            end,
            heatmap,
            output_format,
        } => cmd_score(&input, start, end, heatmap, &output_format),

        Commands::Summary {
            input,
            date,
            trend_days,
            heatmap_weeks,
            output_format,
        } => cmd_summary(&input, date, trend_days, heatmap_weeks, &output_format),
    }
}

fn cmd_detect(
    input: &Path,
    date_column: Option<usize>,
    output_format: &OutputFormat,
) -> Result<(), QuantalyzeCliError> {
    let data = read_spreadsheet(input)?;

    let report = data.validate();
    if !report.is_valid {
        return Err(QuantalyzeCliError::InvalidSheet(report.errors));
    }

    let suggestion = suggest_config(&data, date_column)?;
    info!(
        date_column = suggestion.date_column,
        habits = suggestion.column_mappings.len(),
        "mapping suggested"
    );

    write_output(Path::new("-"), &format_output(&suggestion, output_format)?)
}

fn cmd_import(
    input: &Path,
    output: &Path,
    config: Option<&Path>,
    date_column: Option<usize>,
    output_format: &OutputFormat,
) -> Result<(), QuantalyzeCliError> {
    let data = read_spreadsheet(input)?;

    let report = data.validate();
    if !report.is_valid {
        return Err(QuantalyzeCliError::InvalidSheet(report.errors));
    }

    let config = match config {
        Some(path) => serde_json::from_str::<ImportConfig>(&fs::read_to_string(path)?)?,
        None => suggest_config(&data, date_column)?,
    };

    let batch = build_import(&data, &config)?;
    if batch.logs.is_empty() {
        return Err(QuantalyzeCliError::NoLogs);
    }

    write_output(output, &format_output(&batch, output_format)?)
}

fn cmd_score(
    input: &Path,
    start: NaiveDate,
    end: Option<NaiveDate>,
    heatmap: bool,
    output_format: &OutputFormat,
) -> Result<(), QuantalyzeCliError> {
    let batch: ImportBatch = serde_json::from_str(&read_input(input)?)?;
    let end = end.unwrap_or_else(|| Local::now().date_naive());

    let scores = generate_scores_for_date_range(&batch.habits, &batch.logs, start, end)?;

    let output = if heatmap {
        format_output(&scores_to_heatmap_levels(&scores), output_format)?
    } else {
        format_output(&scores, output_format)?
    };

    write_output(Path::new("-"), &output)
}

fn cmd_summary(
    input: &Path,
    date: Option<NaiveDate>,
    trend_days: u32,
    heatmap_weeks: u32,
    output_format: &OutputFormat,
) -> Result<(), QuantalyzeCliError> {
    let batch: ImportBatch = serde_json::from_str(&read_input(input)?)?;

    let mut processor = ScoreProcessor::new()
        .with_trend_days(trend_days)
        .with_heatmap_weeks(heatmap_weeks);
    if let Some(date) = date {
        processor = processor.with_reference_date(date);
    }

    let summary = processor.summary(&batch.habits, &batch.logs);
    write_output(Path::new("-"), &format_output(&summary, output_format)?)
}

fn suggest_config(
    data: &ParsedSpreadsheetData,
    date_column: Option<usize>,
) -> Result<ImportConfig, QuantalyzeCliError> {
    match date_column {
        Some(index) if index >= data.headers.len() => Err(EngineError::ColumnOutOfRange {
            index,
            columns: data.headers.len(),
        }
        .into()),
        Some(index) => Ok(ImportConfig {
            date_column: index,
            column_mappings: auto_map_columns(data, index),
        }),
        None => Ok(ImportConfig::suggest(data)),
    }
}

fn read_input(input: &Path) -> Result<String, QuantalyzeCliError> {
    if input.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            return Err(QuantalyzeCliError::NoInput);
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn read_spreadsheet(input: &Path) -> Result<ParsedSpreadsheetData, QuantalyzeCliError> {
    if input.to_string_lossy() != "-" {
        let format = SpreadsheetFormat::from_file_name(&input.to_string_lossy())?;
        if format == SpreadsheetFormat::Excel {
            return Err(QuantalyzeCliError::ExcelInput);
        }
    }
    Ok(ParsedSpreadsheetData::from_csv_str(&read_input(input)?)?)
}

fn format_output<T: Serialize>(
    value: &T,
    format: &OutputFormat,
) -> Result<String, QuantalyzeCliError> {
    let mut output = match format {
        OutputFormat::Json => serde_json::to_string(value)?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(value)?,
    };
    output.push('\n');
    Ok(output)
}

fn write_output(output: &Path, data: &str) -> Result<(), QuantalyzeCliError> {
    if output.to_string_lossy() == "-" {
        print!("{}", data);
    } else {
        fs::write(output, data)?;
    }
    Ok(())
}

// Error types

#[derive(Debug)]
enum QuantalyzeCliError {
    Io(io::Error),
    Engine(EngineError),
    Json(serde_json::Error),
    InvalidSheet(Vec<String>),
    ExcelInput,
    NoInput,
    NoLogs,
}

impl From<io::Error> for QuantalyzeCliError {
    fn from(e: io::Error) -> Self {
        QuantalyzeCliError::Io(e)
    }
}

impl From<EngineError> for QuantalyzeCliError {
    fn from(e: EngineError) -> Self {
        QuantalyzeCliError::Engine(e)
    }
}

impl From<serde_json::Error> for QuantalyzeCliError {
    fn from(e: serde_json::Error) -> Self {
        QuantalyzeCliError::Json(e)
    }
}

#[derive(Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<QuantalyzeCliError> for CliError {
    fn from(e: QuantalyzeCliError) -> Self {
        match e {
            QuantalyzeCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            QuantalyzeCliError::Engine(e) => {
                let hint = match &e {
                    EngineError::UnsupportedFormat(_) => "Export the sheet as .csv",
                    EngineError::InvalidDateRange { .. } => "--start must not be after --end",
                    EngineError::InvalidWeight(_) | EngineError::InvalidGoalValue(_) => {
                        "Fix the column mappings in the import config"
                    }
                    _ => "Check input format",
                };
                CliError {
                    code: "ENGINE_ERROR".to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            QuantalyzeCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some(
                    "Check JSON syntax; score and summary expect the output of 'quantalyze import'"
                        .to_string(),
                ),
            },
            QuantalyzeCliError::InvalidSheet(errors) => CliError {
                code: "INVALID_SHEET".to_string(),
                message: errors.join("; "),
                hint: Some(
                    "Ensure the first row is a header with a date column and at least one habit"
                        .to_string(),
                ),
            },
            QuantalyzeCliError::ExcelInput => CliError {
                code: "UNSUPPORTED_FORMAT".to_string(),
                message: "Excel workbooks cannot be decoded by the CLI".to_string(),
                hint: Some("Export the sheet as .csv".to_string()),
            },
            QuantalyzeCliError::NoInput => CliError {
                code: "NO_INPUT".to_string(),
                message: "stdin is a terminal, nothing to read".to_string(),
                hint: Some("Pipe data in or pass --input <file>".to_string()),
            },
            QuantalyzeCliError::NoLogs => CliError {
                code: "NO_LOGS".to_string(),
                message: "No rows with a readable date were found".to_string(),
                hint: Some("Check the date column index and date formats".to_string()),
            },
        }
    }
}
