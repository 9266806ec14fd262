//! HTTP client for the hosted sentiment model.

use crate::models::SentimentScore;
use futures::future::{BoxFuture, FutureExt};
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

/// Default inference endpoint (FinancialBERT on the Hugging Face router).
pub const DEFAULT_ENDPOINT: &str =
    "https://router.huggingface.co/hf-inference/models/ahmedrachid/FinancialBERT-Sentiment-Analysis";

/// Value shipped in example configs in place of a real token.
pub const PLACEHOLDER_TOKEN: &str = "hf_xxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx";

/// A bearer token that passed the placeholder check.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiToken(String);

impl ApiToken {
    /// Accept a token unless it is missing, blank, or the placeholder.
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        let token = raw?.trim();
        if token.is_empty() || token == PLACEHOLDER_TOKEN {
            return None;
        }
        Some(Self(token.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiToken(***)")
    }
}

/// What one classification call produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientReply {
    /// Decoded body, or the error fallback.
    pub body: Value,
    /// Set when the call failed before a JSON body was received.
    pub transport_error: Option<String>,
}

impl ClientReply {
    pub fn ok(body: Value) -> Self {
        Self {
            body,
            transport_error: None,
        }
    }

    /// `[{"label": "Error", "score": 0.0}]` plus the failure reason.
    pub fn fallback(reason: impl Into<String>) -> Self {
        let SentimentScore { label, score } = SentimentScore::transport_error();
        Self {
            body: json!([{"label": label, "score": score}]),
            transport_error: Some(reason.into()),
        }
    }
}

/// Something that classifies a piece of text.
///
/// Implementations make at most one attempt per call and never fail:
/// transport problems come back as [`ClientReply::fallback`].
pub trait Classifier {
    fn classify<'a>(&'a self, text: &'a str) -> BoxFuture<'a, ClientReply>;
}

/// Configuration for the sentiment client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoint: String,
    pub token: ApiToken,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
}

/// Client for a hosted text-classification endpoint.
pub struct SentimentClient {
    config: ClientConfig,
    http_client: reqwest::Client,
}

impl SentimentClient {
    pub fn new(config: ClientConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http_client = builder.build()?;

        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    /// Send one text and decode the body, whatever the status code.
    async fn query(&self, text: &str) -> ClientReply {
        debug!("Classifying: {}", text);

        let response = self
            .http_client
            .post(&self.config.endpoint)
            .bearer_auth(self.config.token.expose())
            .json(&InferenceRequest { inputs: text })
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                let reason = if e.is_timeout() {
                    match self.config.timeout_seconds {
                        Some(secs) => format!("Request timed out after {}s", secs),
                        None => "Request timed out".to_string(),
                    }
                } else if e.is_connect() {
                    format!("Cannot connect to {}", self.config.endpoint)
                } else {
                    format!("Failed to send request: {}", e)
                };
                warn!("{}", reason);
                return ClientReply::fallback(reason);
            }
        };

        let status = response.status();
        if !status.is_success() {
            debug!("Sentiment endpoint answered {}", status);
        }

        match response.json::<Value>().await {
            Ok(body) => ClientReply::ok(body),
            Err(e) => {
                let reason = format!("Malformed response ({}): {}", status, e);
                warn!("{}", reason);
                ClientReply::fallback(reason)
            }
        }
    }
}

impl Classifier for SentimentClient {
    fn classify<'a>(&'a self, text: &'a str) -> BoxFuture<'a, ClientReply> {
        self.query(text).boxed()
    }
}
