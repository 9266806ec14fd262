//! Sentiment classification through a hosted model.
//!
//! `client` talks to the endpoint, `normalizer` turns whatever it answered
//! into a label/score pair.

pub mod client;
pub mod normalizer;

pub use client::{ApiToken, Classifier, ClientConfig, SentimentClient};
pub use normalizer::{LoadingPredicate, Normalized, ResponseNormalizer};
