//! Diagnostics produced while analyzing a ticker.
//!
//! None of these abort a run. The core collects them next to the
//! records it produced and the caller decides how to show them.

use serde::Serialize;
use thiserror::Error;

/// A recoverable problem encountered during one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// The sentiment endpoint could not be reached or returned a body that
    /// was not JSON. The headline is recorded with the error fallback.
    #[error("Connection error: {message}")]
    Transport { message: String },

    /// The endpoint answered with an `error` field.
    #[error("API error: {message}")]
    RemoteModel { message: String },

    /// The endpoint reported that the model is still being loaded.
    #[error("API error: {message}{}", estimated_wait(.estimated_time))]
    RemoteModelLoading {
        message: String,
        estimated_time: Option<f64>,
    },

    /// The news source returned no items for the ticker.
    #[error("No news found for {ticker}")]
    EmptyFeed { ticker: String },

    /// The API token is missing or still set to the placeholder value.
    #[error("No API token configured. Set HF_API_TOKEN, pass --token, or add api.token to .finsight.toml")]
    MissingCredential,
}

fn estimated_wait(estimated_time: &Option<f64>) -> String {
    match estimated_time {
        Some(secs) => format!(
            " (model is waking up, wait about {:.0} seconds and run again)",
            secs
        ),
        None => String::new(),
    }
}

impl Diagnostic {
    /// Short marker used when rendering diagnostics.
    pub fn emoji(&self) -> &'static str {
        match self {
            Diagnostic::Transport { .. } => "❌",
            Diagnostic::RemoteModel { .. } => "⚠️",
            Diagnostic::RemoteModelLoading { .. } => "⏳",
            Diagnostic::EmptyFeed { .. } => "📭",
            Diagnostic::MissingCredential => "🚨",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loading_message_includes_wait() {
        let diag = Diagnostic::RemoteModelLoading {
            message: "Model is currently loading".to_string(),
            estimated_time: Some(20.0),
        };
        let text = diag.to_string();
        assert!(text.contains("currently loading"));
        assert!(text.contains("20 seconds"));
    }

    #[test]
    fn test_loading_message_without_estimate() {
        let diag = Diagnostic::RemoteModelLoading {
            message: "loading".to_string(),
            estimated_time: None,
        };
        assert_eq!(diag.to_string(), "API error: loading");
    }

    #[test]
    fn test_missing_credential_message() {
        let text = Diagnostic::MissingCredential.to_string();
        assert!(text.contains("HF_API_TOKEN"));
        assert_eq!(Diagnostic::MissingCredential.emoji(), "🚨");
    }

    #[test]
    fn test_serializes_with_kind_tag() {
        let diag = Diagnostic::EmptyFeed {
            ticker: "AAPL".to_string(),
        };
        let json = serde_json::to_value(&diag).unwrap();
        assert_eq!(json["kind"], "empty_feed");
        assert_eq!(json["ticker"], "AAPL");
    }
}
