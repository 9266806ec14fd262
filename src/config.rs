//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.finsight.toml` files.

use crate::analysis::DEFAULT_MAX_HEADLINES;
use crate::cli::{OutputFormat, MAX_HEADLINES_LIMIT};
use crate::error::Diagnostic;
use crate::models::SentimentScore;
use crate::news::yahoo::DEFAULT_BASE_URL;
use crate::sentiment::client::DEFAULT_ENDPOINT;
use crate::sentiment::{ApiToken, ClientConfig, LoadingPredicate, ResponseNormalizer};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".finsight.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Sentiment API settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// News feed settings.
    #[serde(default)]
    pub news: NewsConfig,

    /// Normalization and batching settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Ticker analyzed when none is given on the command line.
    #[serde(default = "default_ticker")]
    pub ticker: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            ticker: default_ticker(),
        }
    }
}

fn default_ticker() -> String {
    "NVDA".to_string()
}

/// Sentiment endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Inference endpoint URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Bearer token. Prefer HF_API_TOKEN over storing it here.
    #[serde(default = "default_token")]
    pub token: String,

    /// Request timeout in seconds. Unset means the HTTP client default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            token: default_token(),
            timeout_seconds: None,
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_token() -> String {
    crate::sentiment::client::PLACEHOLDER_TOKEN.to_string()
}

/// News feed settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsConfig {
    /// Yahoo Finance API host.
    #[serde(default = "default_news_url")]
    pub base_url: String,

    /// Number of news items requested from the feed.
    #[serde(default = "default_news_count")]
    pub news_count: usize,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            base_url: default_news_url(),
            news_count: default_news_count(),
        }
    }
}

fn default_news_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_news_count() -> usize {
    10
}

/// Batching and response normalization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Headlines classified per run.
    #[serde(default = "default_max_headlines")]
    pub max_headlines: usize,

    /// Substrings of an API error that mean the model is still loading.
    /// Matched case-insensitively. Empty disables early stop.
    #[serde(default = "default_loading_markers")]
    pub loading_markers: Vec<String>,

    /// Label used when a response has none.
    #[serde(default = "default_label")]
    pub default_label: String,

    /// Score used when a response has none.
    #[serde(default = "default_score")]
    pub default_score: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_headlines: default_max_headlines(),
            loading_markers: default_loading_markers(),
            default_label: default_label(),
            default_score: default_score(),
        }
    }
}

fn default_max_headlines() -> usize {
    DEFAULT_MAX_HEADLINES
}

fn default_loading_markers() -> Vec<String> {
    vec!["loading".to_string()]
}

fn default_label() -> String {
    SentimentScore::neutral().label
}

fn default_score() -> f64 {
    SentimentScore::neutral().score
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Report file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Report format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Write a report file in addition to the terminal summary.
    #[serde(default = "default_true")]
    pub write_file: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            format: OutputFormat::default(),
            write_file: true,
        }
    }
}

fn default_output() -> String {
    "finsight_report.md".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings. Only
    /// values the user actually passed override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref ticker) = args.ticker {
            self.general.ticker = ticker.clone();
        }
        self.general.ticker = self.general.ticker.trim().to_uppercase();

        if let Some(ref token) = args.token {
            self.api.token = token.clone();
        }
        if let Some(ref endpoint) = args.endpoint {
            self.api.endpoint = endpoint.clone();
        }
        if let Some(timeout) = args.timeout {
            self.api.timeout_seconds = Some(timeout);
        }

        if let Some(max) = args.max_headlines {
            self.analysis.max_headlines = max;
        }
        if let Some(ref markers) = args.loading_markers {
            self.analysis.loading_markers = markers.clone();
        }

        if let Some(ref output) = args.output {
            self.report.output = output.display().to_string();
        }
        if let Some(format) = args.format {
            self.report.format = format;
        }
        if args.no_report {
            self.report.write_file = false;
        }
    }

    /// Validate the merged configuration.
    ///
    /// File values do not pass through `Args::validate`, so the same
    /// bounds are checked here once CLI flags have been applied.
    pub fn validate(&self) -> Result<()> {
        let ticker = &self.general.ticker;
        if ticker.is_empty() {
            anyhow::bail!("No ticker given. Pass --ticker or set general.ticker in the config");
        }
        if ticker.chars().any(char::is_whitespace) {
            anyhow::bail!("Invalid ticker: '{}'", ticker);
        }

        if !self.api.endpoint.starts_with("http://") && !self.api.endpoint.starts_with("https://")
        {
            anyhow::bail!("api.endpoint must start with 'http://' or 'https://'");
        }
        if self.api.timeout_seconds == Some(0) {
            anyhow::bail!("api.timeout_seconds must be at least 1");
        }

        let max = self.analysis.max_headlines;
        if max == 0 || max > MAX_HEADLINES_LIMIT {
            anyhow::bail!(
                "analysis.max_headlines must be between 1 and {}, got {}",
                MAX_HEADLINES_LIMIT,
                max
            );
        }

        Ok(())
    }

    /// Build the sentiment client configuration.
    ///
    /// Fails with [`Diagnostic::MissingCredential`] before any request is
    /// made when the token is missing or still the placeholder.
    pub fn client_config(&self) -> Result<ClientConfig, Diagnostic> {
        let token = ApiToken::parse(Some(&self.api.token)).ok_or(Diagnostic::MissingCredential)?;

        Ok(ClientConfig {
            endpoint: self.api.endpoint.clone(),
            token,
            timeout_seconds: self.api.timeout_seconds,
        })
    }

    /// Build the response normalizer from the analysis settings.
    pub fn normalizer(&self) -> ResponseNormalizer {
        ResponseNormalizer::new(
            SentimentScore::new(
                self.analysis.default_label.clone(),
                self.analysis.default_score.clamp(0.0, 1.0),
            ),
            LoadingPredicate::new(self.analysis.loading_markers.iter().cloned()),
        )
    }

    /// Report file path. The default name follows the chosen format.
    pub fn report_path(&self) -> PathBuf {
        let path = PathBuf::from(&self.report.output);
        if self.report.output == default_output() {
            path.with_extension(self.report.format.extension())
        } else {
            path
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
