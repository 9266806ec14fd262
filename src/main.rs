//! FinSight - headline sentiment for a stock ticker
//!
//! A CLI tool that fetches recent news headlines for a ticker, classifies
//! each one with a hosted financial sentiment model, and reports the
//! result as metrics, a confidence chart and a table.
//!
//! Exit codes:
//!   0 - Success (including an empty feed or a run cut short by model loading)
//!   1 - Runtime error (missing token, config, news feed, report write, etc.)

mod analysis;
mod cli;
mod config;
mod error;
mod models;
mod news;
mod report;
mod sentiment;

use analysis::BatchAggregator;
use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use indicatif::{ProgressBar, ProgressStyle};
use models::{AggregationResult, Progress, Report, ReportMetadata, RunStatus};
use news::{NewsSource, YahooNewsClient};
use sentiment::SentimentClient;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("FinSight v{}", env!("CARGO_PKG_VERSION"));
    debug!("Ticker: {:?}, config: {:?}", args.ticker, args.config);

    match run_analysis(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Analysis failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .finsight.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Set api.token there or export HF_API_TOKEN before running.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run one analysis for the configured ticker. Returns the exit code.
async fn run_analysis(args: Args) -> Result<i32> {
    let start_time = Instant::now();

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    config.validate()?;
    let ticker = config.general.ticker.clone();

    let news = YahooNewsClient::new(
        &config.news.base_url,
        config.news.news_count.max(config.analysis.max_headlines),
        config.api.timeout_seconds,
    )?;

    if !args.quiet {
        println!("📰 Fetching news for {} & querying the sentiment model...", ticker);
        println!("   Endpoint: {}", config.api.endpoint);
        println!("   Headlines: up to {}", config.analysis.max_headlines);
    }

    let progress = progress_bar(config.analysis.max_headlines, args.quiet)?;
    let (fetched, result) = classify_feed(&config, &news, &ticker, |p| {
        progress.set_position(p.completed as u64);
        debug!("Progress: {:.0}%", p.fraction() * 100.0);
    })
    .await?;
    progress.finish_and_clear();

    for diagnostic in &result.diagnostics {
        eprintln!("{} {}", diagnostic.emoji(), diagnostic);
    }

    match result.status {
        RunStatus::Empty => info!("No headlines to analyze for {}", ticker),
        RunStatus::StoppedEarly => warn!(
            "Stopped after {} of {} headlines; run again once the model is ready",
            result.records.len(),
            fetched
        ),
        RunStatus::Completed => info!("Classified {} headlines", result.records.len()),
    }

    let metadata = ReportMetadata {
        ticker: ticker.clone(),
        analysis_date: Utc::now(),
        endpoint: config.api.endpoint.clone(),
        headlines_fetched: fetched,
        headlines_analyzed: result.records.len(),
        duration_seconds: start_time.elapsed().as_secs_f64(),
    };
    let report = Report::new(metadata, result);

    if !args.quiet {
        println!("\n{}", report::generate_terminal_summary(&report));
    }

    if config.report.write_file {
        let output = match config.report.format {
            OutputFormat::Json => report::generate_json_report(&report)?,
            OutputFormat::Markdown => report::generate_markdown_report(&report),
        };

        let path = config.report_path();
        report::write_report(&output, &path)?;

        if !args.quiet {
            println!("✅ Report saved to: {}", path.display());
        }
    }

    Ok(0)
}

/// Check the token, then fetch and classify the feed for `ticker`.
///
/// A missing or placeholder token fails with `Diagnostic::MissingCredential`
/// before `news` is queried.
async fn classify_feed<N, F>(
    config: &Config,
    news: &N,
    ticker: &str,
    on_progress: F,
) -> Result<(usize, AggregationResult)>
where
    N: NewsSource + ?Sized,
    F: FnMut(Progress),
{
    let client_config = config.client_config()?;
    let classifier =
        SentimentClient::new(client_config).context("Failed to create sentiment client")?;
    let normalizer = config.normalizer();
    let aggregator = BatchAggregator::new(&classifier, &normalizer)
        .with_max_headlines(config.analysis.max_headlines);

    debug!(
        "Fetching news for {} and querying {} (up to {} headlines)",
        ticker,
        classifier.endpoint(),
        aggregator.max_headlines()
    );

    analysis::analyze_ticker(news, &aggregator, ticker, on_progress).await
}

/// Progress bar advanced after each classified headline.
fn progress_bar(total: usize, quiet: bool) -> Result<ProgressBar> {
    if quiet {
        return Ok(ProgressBar::hidden());
    }

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}",
        )?
        .progress_chars("#>-"),
    );
    Ok(pb)
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}
