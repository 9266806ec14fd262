//! Data models for sentiment analysis runs.
//!
//! This module contains the records produced by the aggregator and the
//! report structure handed to the presentation layer.

use crate::analysis::SentimentSummary;
use crate::error::Diagnostic;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Title used when a news item has none.
pub const DEFAULT_TITLE: &str = "No Title";

/// Link used when a news item has none.
pub const DEFAULT_URL: &str = "#";

/// A single news headline for a ticker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headline {
    pub title: String,
    pub url: String,
}

impl Headline {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }

    /// Build a headline from optional feed fields, applying the defaults.
    pub fn from_parts(title: Option<String>, url: Option<String>) -> Self {
        Self::new(
            title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            url.unwrap_or_else(|| DEFAULT_URL.to_string()),
        )
    }
}

/// A label/score pair as reported by the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore {
    pub label: String,
    pub score: f64,
}

impl SentimentScore {
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }

    /// The pair used when a response carries no usable classification.
    pub fn neutral() -> Self {
        Self::new("Neutral", 0.5)
    }

    /// The pair recorded when the endpoint could not be reached.
    pub fn transport_error() -> Self {
        Self::new("Error", 0.0)
    }
}

impl Default for SentimentScore {
    fn default() -> Self {
        Self::neutral()
    }
}

/// One classified headline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentRecord {
    pub title: String,
    #[serde(rename = "sentiment")]
    pub label: String,
    #[serde(rename = "confidence")]
    pub score: f64,
    pub url: String,
}

impl SentimentRecord {
    pub fn new(headline: &Headline, score: SentimentScore) -> Self {
        Self {
            title: headline.title.clone(),
            label: score.label,
            score: score.score,
            url: headline.url.clone(),
        }
    }
}

/// How an aggregation run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// The feed had no headlines.
    Empty,
    /// Every headline in the batch was classified.
    Completed,
    /// The remote model was still loading and the batch was cut short.
    StoppedEarly,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Empty => write!(f, "No headlines"),
            RunStatus::Completed => write!(f, "Completed"),
            RunStatus::StoppedEarly => write!(f, "Stopped early (model loading)"),
        }
    }
}

/// The records and diagnostics of one aggregation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationResult {
    pub records: Vec<SentimentRecord>,
    pub diagnostics: Vec<Diagnostic>,
    pub status: RunStatus,
}

impl AggregationResult {
    pub fn empty(diagnostic: Diagnostic) -> Self {
        Self {
            records: Vec::new(),
            diagnostics: vec![diagnostic],
            status: RunStatus::Empty,
        }
    }
}

/// Progress through a batch, reported after each recorded headline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.completed as f64 / self.total as f64).min(1.0)
    }
}

/// Metadata about the report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// Ticker that was analyzed.
    pub ticker: String,
    /// Date and time of the analysis.
    pub analysis_date: DateTime<Utc>,
    /// Sentiment endpoint that classified the headlines.
    pub endpoint: String,
    /// Number of headlines fetched for the batch.
    pub headlines_fetched: usize,
    /// Number of headlines that produced a record.
    pub headlines_analyzed: usize,
    /// Duration of the run in seconds.
    pub duration_seconds: f64,
}

/// The complete sentiment report.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub status: RunStatus,
    pub summary: SentimentSummary,
    pub records: Vec<SentimentRecord>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Report {
    pub fn new(metadata: ReportMetadata, result: AggregationResult) -> Self {
        let summary = SentimentSummary::from_records(&result.records);
        Self {
            metadata,
            status: result.status,
            summary,
            records: result.records,
            diagnostics: result.diagnostics,
        }
    }
}
