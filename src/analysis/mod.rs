//! Analysis modules.
//!
//! `aggregator` drives the per-headline classification, `summary` computes
//! the metrics shown alongside the results.

pub mod aggregator;
pub mod summary;

pub use aggregator::{analyze_ticker, BatchAggregator, DEFAULT_MAX_HEADLINES};
pub use summary::{label_color, SentimentSummary};
