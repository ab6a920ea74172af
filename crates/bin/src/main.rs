//! CAPM CLI binary.
//!
//! Estimates a security's expected return against a benchmark index.

use capm::{
    AnnualizationMethod, CapmConfig, CapmError, CapmEstimator, CapmReport, CapmRequest,
    CsvPriceSource, ExportFormat, Exporter, YahooQuoteProvider,
};
use chrono::{Duration, NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::process;
use std::time::Duration as StdDuration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "capm")]
#[command(about = "CAPM expected return (cost of equity) estimation", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate beta and expected return for a stock
    Estimate(EstimateArgs),
}

#[derive(clap::Args)]
struct EstimateArgs {
    /// Stock symbol
    ticker: String,

    /// Benchmark index symbol
    #[arg(long, default_value = "^GSPC")]
    benchmark: String,

    /// History length in years, ending today
    #[arg(long, default_value = "2")]
    years: u32,

    /// First date of the history (YYYY-MM-DD)
    #[arg(long, conflicts_with = "years")]
    start: Option<NaiveDate>,

    /// Exclusive end of the history (YYYY-MM-DD), defaults to today
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Annual risk-free rate as a decimal
    #[arg(long = "risk-free", default_value = "0.04")]
    risk_free: f64,

    /// Return periods per year
    #[arg(long, default_value = "252")]
    periods: u32,

    /// Use log returns instead of simple returns
    #[arg(long)]
    log_returns: bool,

    /// Market return annualization (arithmetic or geometric)
    #[arg(long, default_value = "arithmetic")]
    method: String,

    /// Suppress progress and stage logging
    #[arg(long)]
    quiet: bool,

    /// Read prices from a local CSV file instead of Yahoo Finance
    #[arg(long)]
    prices: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Csv,
    Markdown,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        if let Some(failure) = e.downcast_ref::<CapmError>() {
            eprintln!("Reason: {}", failure.kind());
        }
        process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Estimate(args) => {
            init_tracing(args.quiet);
            estimate(args).await?;
        }
    }

    Ok(())
}

fn init_tracing(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Resolve the requested history into a `[start, end)` pair.
fn resolve_period(
    years: u32,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
) -> (NaiveDate, NaiveDate) {
    let end = end.unwrap_or(today);
    let start = start.unwrap_or_else(|| end - Duration::days(365 * i64::from(years)));
    (start, end)
}

fn build_config(args: &EstimateArgs) -> Result<CapmConfig, CapmError> {
    let method: AnnualizationMethod = args.method.parse()?;
    let config = CapmConfig::default()
        .with_periods_per_year(args.periods)
        .with_log_returns(args.log_returns)
        .with_annualization(method)
        .with_verbose(!args.quiet);
    config.validate()?;
    Ok(config)
}

async fn estimate(args: EstimateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = build_config(&args)?;
    let (start, end) = resolve_period(args.years, args.start, args.end, Utc::now().date_naive());
    let request = CapmRequest::new(&args.ticker, &args.benchmark, start, end, args.risk_free);

    let result = match &args.prices {
        Some(path) => {
            CapmEstimator::new(CsvPriceSource::new(path), config.clone())
                .estimate(&request)
                .await
        }
        None => {
            let estimator = CapmEstimator::new(YahooQuoteProvider::new()?, config.clone());
            let pb = fetch_spinner(&request, args.quiet)?;
            let result = estimator.estimate(&request).await;
            pb.finish_and_clear();
            result
        }
    }?;

    let report = CapmReport::new(&request, &config, result);
    let rendered = render(&report, args.format)?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, rendered)?;
            info!(path = %path.display(), "report written");
        }
        None => print!("{}", rendered),
    }

    Ok(())
}

fn fetch_spinner(
    request: &CapmRequest,
    quiet: bool,
) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    if quiet {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(StdDuration::from_millis(100));
    pb.set_message(format!(
        "Fetching {} and {} from Yahoo Finance...",
        request.ticker, request.benchmark
    ));
    Ok(pb)
}

fn render(report: &CapmReport, format: OutputFormat) -> Result<String, Box<dyn std::error::Error>> {
    let rendered = match format {
        OutputFormat::Text => report.to_ascii_table(),
        OutputFormat::Markdown => report.to_markdown(),
        OutputFormat::Json => {
            let mut json = report.export_to_string(ExportFormat::PrettyJson)?;
            json.push('\n');
            json
        }
        OutputFormat::Csv => report.export_to_string(ExportFormat::Csv)?,
    };
    Ok(rendered)
}
