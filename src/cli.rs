//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// FinSight - headline sentiment for a stock ticker
///
/// Fetches the latest news headlines for a ticker, classifies each one
/// with a hosted financial sentiment model, and summarizes the result.
///
/// Examples:
///   finsight --ticker NVDA
///   finsight --ticker AAPL --format json --output aapl.json
///   finsight --ticker TSLA --max-headlines 3 --no-report
///   finsight --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Stock ticker to analyze (default: NVDA, or general.ticker from config)
    #[arg(short, long, value_name = "SYMBOL")]
    pub ticker: Option<String>,

    /// API token for the sentiment endpoint
    #[arg(long, env = "HF_API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Sentiment inference endpoint URL
    #[arg(long, value_name = "URL", env = "FINSIGHT_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Number of headlines to classify (1-20)
    #[arg(long, value_name = "COUNT")]
    pub max_headlines: Option<usize>,

    /// Request timeout in seconds
    ///
    /// Applies to both the news feed and the sentiment endpoint. When unset,
    /// the HTTP client default is used.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Text in an API error that means the model is still loading
    ///
    /// Repeat or comma-separate for several markers. Matching is
    /// case-insensitive. Replaces the configured markers.
    #[arg(long = "loading-marker", value_name = "TEXT", value_delimiter = ',')]
    pub loading_markers: Option<Vec<String>>,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Report format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Print the summary only, do not write a report file
    #[arg(long)]
    pub no_report: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .finsight.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .finsight.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Json => "json",
        }
    }
}

/// Upper bound on headlines per run.
pub const MAX_HEADLINES_LIMIT: usize = 20;

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if let Some(ref ticker) = self.ticker {
            let ticker = ticker.trim();
            if ticker.is_empty() {
                return Err("Ticker must not be empty".to_string());
            }
            if ticker.chars().any(char::is_whitespace) {
                return Err(format!("Invalid ticker: '{}'", ticker));
            }
        }

        if let Some(ref endpoint) = self.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err("Endpoint URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(max) = self.max_headlines {
            if max == 0 || max > MAX_HEADLINES_LIMIT {
                return Err(format!(
                    "Max headlines must be between 1 and {}",
                    MAX_HEADLINES_LIMIT
                ));
            }
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.no_report && self.output.is_some() {
            return Err("Cannot use --output together with --no-report".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            ticker: Some("NVDA".to_string()),
            token: Some("hf_test".to_string()),
            endpoint: None,
            max_headlines: None,
            timeout: None,
            loading_markers: None,
            output: None,
            format: None,
            no_report: false,
            config: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_valid_args() {
        assert!(make_args().validate().is_ok());
    }

    #[test]
    fn test_validation_empty_ticker() {
        let mut args = make_args();
        args.ticker = Some("  ".to_string());
        assert!(args.validate().is_err());

        args.ticker = Some("BRK B".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_endpoint() {
        let mut args = make_args();
        args.endpoint = Some("router.huggingface.co/models/x".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_headline_bounds() {
        let mut args = make_args();
        args.max_headlines = Some(0);
        assert!(args.validate().is_err());
        args.max_headlines = Some(21);
        assert!(args.validate().is_err());
        args.max_headlines = Some(20);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.no_report = true;
        args.output = Some(PathBuf::from("report.md"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_init_config_skips_validation() {
        let mut args = make_args();
        args.ticker = Some(String::new());
        args.init_config = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_loading_markers_split_on_commas() {
        let args = Args::parse_from(["finsight", "--loading-marker", "loading,warming up"]);
        assert_eq!(
            args.loading_markers,
            Some(vec!["loading".to_string(), "warming up".to_string()])
        );
    }

    #[test]
    fn test_format_parsing() {
        let args = Args::parse_from(["finsight", "--format", "json"]);
        assert_eq!(args.format, Some(OutputFormat::Json));
        assert_eq!(OutputFormat::Json.extension(), "json");
    }
}
