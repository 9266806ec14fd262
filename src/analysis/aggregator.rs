//! Batch classification of headlines.
//!
//! Headlines are classified strictly one after another. A run stops early
//! when the remote model reports that it is still loading, since every
//! following call would fail the same way.

use crate::error::Diagnostic;
use crate::models::{AggregationResult, Headline, Progress, RunStatus, SentimentRecord};
use crate::news::NewsSource;
use crate::sentiment::{Classifier, Normalized, ResponseNormalizer};
use anyhow::{Context, Result};
use tracing::{debug, info, warn};

/// Default number of headlines classified per run.
pub const DEFAULT_MAX_HEADLINES: usize = 5;

/// Runs a classifier and normalizer over a batch of headlines.
pub struct BatchAggregator<'a, C: Classifier + ?Sized> {
    classifier: &'a C,
    normalizer: &'a ResponseNormalizer,
    max_headlines: usize,
}

impl<'a, C: Classifier + ?Sized> BatchAggregator<'a, C> {
    pub fn new(classifier: &'a C, normalizer: &'a ResponseNormalizer) -> Self {
        Self {
            classifier,
            normalizer,
            max_headlines: DEFAULT_MAX_HEADLINES,
        }
    }

    pub fn with_max_headlines(mut self, max_headlines: usize) -> Self {
        self.max_headlines = max_headlines.max(1);
        self
    }

    pub fn max_headlines(&self) -> usize {
        self.max_headlines
    }

    /// Classify up to `max_headlines` headlines from the front of `headlines`.
    ///
    /// `on_progress` is called after each recorded headline.
    pub async fn run<F>(
        &self,
        ticker: &str,
        headlines: &[Headline],
        mut on_progress: F,
    ) -> AggregationResult
    where
        F: FnMut(Progress),
    {
        if headlines.is_empty() {
            let diagnostic = Diagnostic::EmptyFeed {
                ticker: ticker.to_string(),
            };
            warn!("{}", diagnostic);
            return AggregationResult::empty(diagnostic);
        }

        let batch = &headlines[..headlines.len().min(self.max_headlines)];
        info!("Classifying {} headlines for {}", batch.len(), ticker);

        let mut records = Vec::with_capacity(batch.len());
        let mut diagnostics = Vec::new();
        let mut status = RunStatus::Completed;

        for (index, headline) in batch.iter().enumerate() {
            let reply = self.classifier.classify(&headline.title).await;
            if let Some(reason) = reply.transport_error {
                diagnostics.push(Diagnostic::Transport { message: reason });
            }

            let score = match self.normalizer.normalize(&reply.body) {
                Normalized::Scored(score) => score,
                Normalized::RemoteError {
                    fallback,
                    diagnostic,
                } => {
                    diagnostics.push(diagnostic);
                    fallback
                }
                Normalized::ModelLoading(diagnostic) => {
                    info!(
                        "Model loading, skipping remaining {} headlines",
                        batch.len() - index
                    );
                    diagnostics.push(diagnostic);
                    status = RunStatus::StoppedEarly;
                    break;
                }
            };

            debug!("{} -> {} ({:.2})", headline.title, score.label, score.score);
            records.push(SentimentRecord::new(headline, score));

            on_progress(Progress {
                completed: index + 1,
                total: self.max_headlines,
            });
        }

        AggregationResult {
            records,
            diagnostics,
            status,
        }
    }
}

/// Fetch the news feed for `ticker` and classify its leading headlines.
pub async fn analyze_ticker<N, C, F>(
    news: &N,
    aggregator: &BatchAggregator<'_, C>,
    ticker: &str,
    on_progress: F,
) -> Result<(usize, AggregationResult)>
where
    N: NewsSource + ?Sized,
    C: Classifier + ?Sized,
    F: FnMut(Progress),
{
    let headlines = news
        .headlines(ticker)
        .await
        .with_context(|| format!("Failed to fetch news for {}", ticker))?;
    debug!("News feed returned {} items", headlines.len());

    let fetched = headlines.len().min(aggregator.max_headlines());
    let result = aggregator.run(ticker, &headlines, on_progress).await;
    Ok((fetched, result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentiment::client::ClientReply;
    use futures::future::{BoxFuture, FutureExt};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Answers from a script keyed by headline title.
    struct ScriptedClassifier {
        replies: HashMap<String, ClientReply>,
        fallback: Value,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedClassifier {
        fn uniform(body: Value) -> Self {
            Self {
                replies: HashMap::new(),
                fallback: body,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn with(mut self, title: &str, reply: ClientReply) -> Self {
            self.replies.insert(title.to_string(), reply);
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Classifier for ScriptedClassifier {
        fn classify<'a>(&'a self, text: &'a str) -> BoxFuture<'a, ClientReply> {
            self.calls.lock().unwrap().push(text.to_string());
            let reply = self
                .replies
                .get(text)
                .cloned()
                .unwrap_or_else(|| ClientReply::ok(self.fallback.clone()));
            async move { reply }.boxed()
        }
    }

    struct FixedNews(Vec<Headline>);

    impl NewsSource for FixedNews {
        fn headlines<'a>(&'a self, _ticker: &'a str) -> BoxFuture<'a, Result<Vec<Headline>>> {
            let items = self.0.clone();
            async move { Ok(items) }.boxed()
        }
    }

    struct BrokenNews;

    impl NewsSource for BrokenNews {
        fn headlines<'a>(&'a self, _ticker: &'a str) -> BoxFuture<'a, Result<Vec<Headline>>> {
            async { Err(anyhow::anyhow!("feed unavailable")) }.boxed()
        }
    }

    fn headlines(titles: &[&str]) -> Vec<Headline> {
        titles
            .iter()
            .map(|t| Headline::new(*t, format!("https://news.example/{}", t)))
            .collect()
    }

    fn run(
        classifier: &ScriptedClassifier,
        items: &[Headline],
    ) -> (AggregationResult, Vec<Progress>) {
        let normalizer = ResponseNormalizer::default();
        let aggregator = BatchAggregator::new(classifier, &normalizer);
        let mut progress = Vec::new();
        let result =
            tokio_test::block_on(aggregator.run("NVDA", items, |p| progress.push(p)));
        (result, progress)
    }

    #[test]
    fn test_uniform_positive_batch() {
        let classifier = ScriptedClassifier::uniform(json!([{"label": "positive", "score": 0.9}]));
        let (result, progress) = run(&classifier, &headlines(&["A", "B", "C", "D", "E"]));

        assert_eq!(result.status, RunStatus::Completed);
        assert_eq!(result.records.len(), 5);
        assert!(result
            .records
            .iter()
            .all(|r| r.label == "positive" && r.score == 0.9));
        assert!(result.diagnostics.is_empty());
        assert_eq!(progress.len(), 5);
        assert_eq!(progress[4].fraction(), 1.0);
    }

    #[test]
    fn test_only_first_five_processed() {
        let classifier = ScriptedClassifier::uniform(json!([{"label": "neutral", "score": 0.6}]));
        let (result, _) = run(
            &classifier,
            &headlines(&["A", "B", "C", "D", "E", "F", "G"]),
        );

        assert_eq!(result.records.len(), 5);
        assert_eq!(classifier.calls(), vec!["A", "B", "C", "D", "E"]);
    }

    #[test]
    fn test_records_keep_headline_order_and_urls() {
        let classifier = ScriptedClassifier::uniform(json!([[{"label": "negative", "score": 0.8}]]))
            .with("B", ClientReply::ok(json!([{"label": "positive", "score": 0.7}])));
        let (result, _) = run(&classifier, &headlines(&["A", "B", "C"]));

        let titles: Vec<_> = result.records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B", "C"]);
        assert_eq!(result.records[1].label, "positive");
        assert_eq!(result.records[1].url, "https://news.example/B");
        assert_eq!(result.records[2].label, "negative");
    }

    #[test]
    fn test_empty_feed_makes_no_calls() {
        let classifier = ScriptedClassifier::uniform(json!([]));
        let (result, progress) = run(&classifier, &[]);

        assert_eq!(result.status, RunStatus::Empty);
        assert!(result.records.is_empty());
        assert_eq!(
            result.diagnostics,
            vec![Diagnostic::EmptyFeed {
                ticker: "NVDA".to_string()
            }]
        );
        assert!(classifier.calls().is_empty());
        assert!(progress.is_empty());
    }

    #[test]
    fn test_loading_stops_batch() {
        let classifier = ScriptedClassifier::uniform(json!([{"label": "positive", "score": 0.9}]))
            .with(
                "B",
                ClientReply::ok(json!({"error": "model X is loading", "estimated_time": 20})),
            );
        let (result, progress) = run(&classifier, &headlines(&["A", "B", "C", "D", "E"]));

        assert_eq!(result.status, RunStatus::StoppedEarly);
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].title, "A");
        assert_eq!(classifier.calls(), vec!["A", "B"]);
        assert_eq!(progress.len(), 1);
        assert!(matches!(
            result.diagnostics.last(),
            Some(Diagnostic::RemoteModelLoading { .. })
        ));
    }

    #[test]
    fn test_remote_error_records_default_and_continues() {
        let classifier = ScriptedClassifier::uniform(json!([{"label": "positive", "score": 0.9}]))
            .with("A", ClientReply::ok(json!({"error": "rate limited"})));
        let (result, _) = run(&classifier, &headlines(&["A", "B"]));

        assert_eq!(result.status, RunStatus::Completed);
        assert_eq!(result.records.len(), 2);
        assert_eq!(result.records[0].label, "Neutral");
        assert_eq!(result.records[0].score, 0.5);
        assert_eq!(result.records[1].label, "positive");
        assert_eq!(
            result.diagnostics,
            vec![Diagnostic::RemoteModel {
                message: "rate limited".to_string()
            }]
        );
    }

    #[test]
    fn test_transport_failure_records_error_fallback() {
        let classifier = ScriptedClassifier::uniform(json!([{"label": "positive", "score": 0.9}]))
            .with("A", ClientReply::fallback("Cannot connect"));
        let (result, _) = run(&classifier, &headlines(&["A", "B"]));

        assert_eq!(result.records[0].label, "Error");
        assert_eq!(result.records[0].score, 0.0);
        assert_eq!(
            result.diagnostics,
            vec![Diagnostic::Transport {
                message: "Cannot connect".to_string()
            }]
        );
        assert_eq!(result.records.len(), 2);
    }

    #[test]
    fn test_progress_uses_batch_size_denominator() {
        let classifier = ScriptedClassifier::uniform(json!([{"label": "positive", "score": 0.9}]));
        let (_, progress) = run(&classifier, &headlines(&["A", "B"]));

        assert_eq!(
            progress,
            vec![
                Progress {
                    completed: 1,
                    total: 5
                },
                Progress {
                    completed: 2,
                    total: 5
                },
            ]
        );
    }

    #[test]
    fn test_runs_are_repeatable() {
        let classifier = ScriptedClassifier::uniform(json!([{"label": "negative", "score": 0.4}]))
            .with("C", ClientReply::ok(json!({"error": "rate limited"})));
        let items = headlines(&["A", "B", "C", "D"]);

        let (first, _) = run(&classifier, &items);
        let (second, _) = run(&classifier, &items);
        assert_eq!(first, second);
    }

    #[test]
    fn test_custom_batch_size() {
        let classifier = ScriptedClassifier::uniform(json!([{"label": "positive", "score": 0.9}]));
        let normalizer = ResponseNormalizer::default();
        let aggregator = BatchAggregator::new(&classifier, &normalizer).with_max_headlines(2);

        let result = tokio_test::block_on(aggregator.run(
            "NVDA",
            &headlines(&["A", "B", "C"]),
            |_| {},
        ));
        assert_eq!(result.records.len(), 2);
    }

    #[tokio::test]
    async fn test_analyze_ticker_reports_fetched_count() {
        let classifier = ScriptedClassifier::uniform(json!([{"label": "positive", "score": 0.9}]));
        let normalizer = ResponseNormalizer::default();
        let aggregator = BatchAggregator::new(&classifier, &normalizer);
        let news = FixedNews(headlines(&["A", "B", "C", "D", "E", "F"]));

        let (fetched, result) = analyze_ticker(&news, &aggregator, "NVDA", |_| {})
            .await
            .unwrap();
        assert_eq!(fetched, 5);
        assert_eq!(result.records.len(), 5);
    }

    #[tokio::test]
    async fn test_analyze_ticker_propagates_feed_failure() {
        let classifier = ScriptedClassifier::uniform(json!([]));
        let normalizer = ResponseNormalizer::default();
        let aggregator = BatchAggregator::new(&classifier, &normalizer);

        let err = analyze_ticker(&BrokenNews, &aggregator, "NVDA", |_| {})
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to fetch news for NVDA"));
        assert!(classifier.calls().is_empty());
    }
}
