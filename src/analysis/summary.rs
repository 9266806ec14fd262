//! Summary statistics over classified headlines.

use crate::models::SentimentRecord;
use serde::Serialize;
use std::collections::BTreeMap;

/// Chart colour for a sentiment label, if it has one.
///
/// Keys are matched exactly; the model emits lowercase labels while the
/// normalizer's default pair is `Neutral`, which is left to the renderer's
/// default colour.
pub fn label_color(label: &str) -> Option<&'static str> {
    match label {
        "positive" => Some("green"),
        "negative" => Some("red"),
        "neutral" => Some("gray"),
        _ => None,
    }
}

/// Headline metrics for a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SentimentSummary {
    /// Number of records.
    pub total: usize,
    /// Most frequent label. Ties go to the alphabetically first label.
    pub top_sentiment: Option<String>,
    /// Mean confidence across all records.
    pub average_confidence: Option<f64>,
    /// Records per label, most frequent first.
    pub by_label: Vec<(String, usize)>,
}

impl SentimentSummary {
    pub fn from_records(records: &[SentimentRecord]) -> Self {
        if records.is_empty() {
            return Self::default();
        }

        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for record in records {
            *counts.entry(record.label.as_str()).or_default() += 1;
        }

        let mut by_label: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(label, count)| (label.to_string(), count))
            .collect();
        // Stable sort keeps alphabetical order among equal counts.
        by_label.sort_by_key(|(_, count)| std::cmp::Reverse(*count));

        let sum: f64 = records.iter().map(|r| r.score).sum();

        Self {
            total: records.len(),
            top_sentiment: by_label.first().map(|(label, _)| label.clone()),
            average_confidence: Some(sum / records.len() as f64),
            by_label,
        }
    }

    /// The top sentiment, or `n/a` when nothing was classified.
    pub fn top_sentiment_text(&self) -> &str {
        self.top_sentiment.as_deref().unwrap_or("n/a")
    }

    /// The mean confidence with two decimals, or `n/a`.
    pub fn average_confidence_text(&self) -> String {
        match self.average_confidence {
            Some(mean) => format!("{:.2}", mean),
            None => "n/a".to_string(),
        }
    }
}
