//! Normalization of classifier responses.
//!
//! The hosted model answers in several JSON shapes depending on the
//! pipeline configuration and on its own state. This module inspects the
//! shape once, turns it into a [`RawSentimentResponse`], and maps that
//! onto a single label/score pair.

use crate::error::Diagnostic;
use crate::models::SentimentScore;
use serde_json::{Map, Value};
use tracing::{error, warn};

/// Structural classification of a raw response body.
#[derive(Debug, Clone, PartialEq)]
pub enum RawSentimentResponse {
    /// `[[{label, score}, ...]]`. Holds `r[0][0]`, if present.
    ListOfList(Option<Value>),
    /// `[{label, score}, ...]`. Holds `r[0]`.
    ListOfObject(Map<String, Value>),
    /// `{"error": ..., "estimated_time": ...}`
    ErrorObject {
        message: String,
        estimated_time: Option<f64>,
    },
    /// Empty lists, objects without `error`, scalars and null.
    Other,
}

impl RawSentimentResponse {
    /// Classify a decoded response body by its structure.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Array(items) => match items.first() {
                Some(Value::Array(inner)) => Self::ListOfList(inner.first().cloned()),
                Some(Value::Object(first)) => Self::ListOfObject(first.clone()),
                _ => Self::Other,
            },
            Value::Object(map) => match map.get("error") {
                Some(err) => Self::ErrorObject {
                    message: error_text(err),
                    estimated_time: map.get("estimated_time").and_then(Value::as_f64),
                },
                None => Self::Other,
            },
            _ => Self::Other,
        }
    }
}

fn error_text(err: &Value) -> String {
    match err {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Decides whether an error message means the model is still loading.
///
/// Matches case-insensitively against a list of markers. An empty list
/// never matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadingPredicate {
    markers: Vec<String>,
}

impl LoadingPredicate {
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            markers: markers
                .into_iter()
                .map(|m| m.into().to_lowercase())
                .filter(|m| !m.is_empty())
                .collect(),
        }
    }

    pub fn is_loading(&self, message: &str) -> bool {
        let message = message.to_lowercase();
        self.markers.iter().any(|m| message.contains(m.as_str()))
    }
}

impl Default for LoadingPredicate {
    fn default() -> Self {
        Self::new(["loading"])
    }
}

/// Result of normalizing one response.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    /// A usable pair, possibly the defaults.
    Scored(SentimentScore),
    /// The endpoint reported an error; the defaults stand in for it.
    RemoteError {
        fallback: SentimentScore,
        diagnostic: Diagnostic,
    },
    /// The model is not ready. The batch should stop here.
    ModelLoading(Diagnostic),
}

/// Maps raw responses onto label/score pairs.
#[derive(Debug, Clone, Default)]
pub struct ResponseNormalizer {
    defaults: SentimentScore,
    loading: LoadingPredicate,
}

impl ResponseNormalizer {
    pub fn new(defaults: SentimentScore, loading: LoadingPredicate) -> Self {
        Self { defaults, loading }
    }

    pub fn normalize(&self, body: &Value) -> Normalized {
        match RawSentimentResponse::from_value(body) {
            RawSentimentResponse::ListOfList(Some(Value::Object(entry))) => {
                Normalized::Scored(self.read_entry(&entry))
            }
            RawSentimentResponse::ListOfList(_) => Normalized::Scored(self.defaults.clone()),
            RawSentimentResponse::ListOfObject(entry) => {
                Normalized::Scored(self.read_entry(&entry))
            }
            RawSentimentResponse::ErrorObject {
                message,
                estimated_time,
            } => {
                if self.loading.is_loading(&message) {
                    let diagnostic = Diagnostic::RemoteModelLoading {
                        message,
                        estimated_time,
                    };
                    warn!("{}", diagnostic);
                    Normalized::ModelLoading(diagnostic)
                } else {
                    let diagnostic = Diagnostic::RemoteModel { message };
                    error!("{}", diagnostic);
                    Normalized::RemoteError {
                        fallback: self.defaults.clone(),
                        diagnostic,
                    }
                }
            }
            RawSentimentResponse::Other => Normalized::Scored(self.defaults.clone()),
        }
    }

    /// Read `label` and `score`, falling back per field.
    fn read_entry(&self, entry: &Map<String, Value>) -> SentimentScore {
        let label = entry
            .get("label")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| self.defaults.label.clone());

        let score = entry
            .get("score")
            .and_then(Value::as_f64)
            .filter(|s| s.is_finite())
            .map(|s| s.clamp(0.0, 1.0))
            .unwrap_or(self.defaults.score);

        SentimentScore { label, score }
    }
}
