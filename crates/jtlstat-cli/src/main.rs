use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use jtlstat_core::report::export::export_json;
use jtlstat_core::{pipeline, EngineConfig, JtlError, MalformedLinePolicy, Schema};
use tokio::io::{self, AsyncBufRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "jtlstat")]
#[command(about = "Per-label summary of a JMeter JTL results log", long_about = None)]
#[command(version)]
struct Cli {
    /// JTL results file (reads stdin when omitted or `-`)
    input: Option<PathBuf>,

    /// Where to write the summary (stdout when omitted or `-`)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Input layout: `byte-aware` (bytes in column 9) or `reduced`
    #[arg(long, env = "JTLSTAT_SCHEMA", default_value = "byte-aware")]
    schema: Schema,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,

    /// Fail on the first malformed line instead of skipping it
    #[arg(long)]
    strict: bool,

    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

impl Cli {
    fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            schema: self.schema,
            malformed: if self.strict {
                MalformedLinePolicy::Abort
            } else {
                MalformedLinePolicy::Skip
            },
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr; stdout may be the report sink.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: &Cli) -> Result<(), JtlError> {
    let config = cli.engine_config();
    info!(schema = %config.schema, format = ?cli.format, "Summarising results log");

    let reader = open_input(cli.input.as_deref()).await?;
    let report = pipeline::aggregate(reader, config).await?;

    // Only create the output once there is a report to put in it.
    let mut writer = open_output(cli.output.as_deref()).await?;
    match cli.format {
        OutputFormat::Csv => pipeline::write_report(&report, &mut writer).await?,
        OutputFormat::Json => {
            let json = export_json(&report)?;
            writer.write_all(json.as_bytes()).await?;
            writer.write_all(b"\n").await?;
        }
    }
    writer.flush().await?;
    writer.shutdown().await?;

    if report.skipped_lines > 0 {
        warn!(skipped = report.skipped_lines, "Some lines could not be parsed");
    }
    info!(labels = report.len(), "Summary written");
    Ok(())
}

fn is_stdio(path: Option<&Path>) -> bool {
    path.map_or(true, |p| p.as_os_str() == "-")
}

async fn open_input(path: Option<&Path>) -> Result<Box<dyn AsyncBufRead + Unpin + Send>, JtlError> {
    match path {
        Some(p) if !is_stdio(Some(p)) => {
            let file = tokio::fs::File::open(p).await?;
            Ok(Box::new(BufReader::new(file)))
        }
        _ => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}

async fn open_output(path: Option<&Path>) -> Result<Box<dyn AsyncWrite + Unpin + Send>, JtlError> {
    match path {
        Some(p) if !is_stdio(Some(p)) => Ok(Box::new(tokio::fs::File::create(p).await?)),
        _ => Ok(Box::new(io::stdout())),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
