//! News feeds that supply headlines for a ticker.

pub mod yahoo;

use crate::models::Headline;
use anyhow::Result;
use futures::future::BoxFuture;

pub use yahoo::YahooNewsClient;

/// A source of recent headlines for a ticker, newest first.
pub trait NewsSource {
    fn headlines<'a>(&'a self, ticker: &'a str) -> BoxFuture<'a, Result<Vec<Headline>>>;
}
