//! Yahoo Finance news search.
//!
//! Uses the public search endpoint, which returns recent news items for a
//! symbol alongside quote matches. Only `title` and `link` are read.

use super::NewsSource;
use crate::models::Headline;
use anyhow::{Context, Result};
use futures::future::{BoxFuture, FutureExt};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// Default Yahoo Finance API host.
pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Search API response. Only the news list matters here.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    news: Vec<NewsItem>,
}

#[derive(Debug, Deserialize)]
struct NewsItem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    link: Option<String>,
}

/// Yahoo Finance news client.
pub struct YahooNewsClient {
    base_url: String,
    news_count: usize,
    client: reqwest::Client,
}

impl YahooNewsClient {
    pub fn new(base_url: &str, news_count: usize, timeout_seconds: Option<u64>) -> Result<Self> {
        // Yahoo rejects requests without a browser-like user agent.
        let mut builder = reqwest::Client::builder().user_agent("Mozilla/5.0");
        if let Some(secs) = timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            news_count,
            client: builder.build().context("Failed to create HTTP client")?,
        })
    }

    fn search_request(&self, ticker: &str) -> reqwest::RequestBuilder {
        let news_count = self.news_count.to_string();
        self.client
            .get(format!("{}/v1/finance/search", self.base_url))
            .query(&[
                ("q", ticker),
                ("newsCount", news_count.as_str()),
                ("quotesCount", "0"),
            ])
    }

    async fn fetch(&self, ticker: &str) -> Result<Vec<Headline>> {
        let request = self
            .search_request(ticker)
            .build()
            .context("Failed to build news request")?;
        info!("Fetching news for {}", ticker);
        debug!("News URL: {}", request.url());

        let response = self
            .client
            .execute(request)
            .await
            .context("Failed to send news request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("News API error {}: {}", status, body);
        }

        let search: SearchResponse = response
            .json()
            .await
            .context("Failed to parse news response")?;

        Ok(parse_headlines(search))
    }
}

fn parse_headlines(search: SearchResponse) -> Vec<Headline> {
    search
        .news
        .into_iter()
        .map(|item| Headline::from_parts(item.title, item.link))
        .collect()
}

impl NewsSource for YahooNewsClient {
    fn headlines<'a>(&'a self, ticker: &'a str) -> BoxFuture<'a, Result<Vec<Headline>>> {
        self.fetch(ticker).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query_pairs(client: &YahooNewsClient, ticker: &str) -> Vec<(String, String)> {
        let request = client.search_request(ticker).build().unwrap();
        request.url().query_pairs().into_owned().collect()
    }

    #[test]
    fn test_search_url() {
        let client = YahooNewsClient::new("https://query1.finance.yahoo.com/", 10, None).unwrap();
        let request = client.search_request("NVDA").build().unwrap();
        assert_eq!(
            request.url().as_str(),
            "https://query1.finance.yahoo.com/v1/finance/search?q=NVDA&newsCount=10&quotesCount=0"
        );
    }

    #[test]
    fn test_search_url_encodes_ticker() {
        let client = YahooNewsClient::new(DEFAULT_BASE_URL, 10, None).unwrap();

        let pairs = query_pairs(&client, "AT&T");
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[0], ("q".to_string(), "AT&T".to_string()));
        assert_eq!(pairs[1], ("newsCount".to_string(), "10".to_string()));

        let pairs = query_pairs(&client, "BRK#B");
        assert_eq!(pairs[0], ("q".to_string(), "BRK#B".to_string()));
        assert_eq!(pairs[2], ("quotesCount".to_string(), "0".to_string()));
    }

    #[test]
    fn test_parse_news_with_missing_fields() {
        let body = r#"{
            "quotes": [],
            "news": [
                {"uuid": "1", "title": "Nvidia beats estimates", "link": "https://finance.yahoo.com/a"},
                {"uuid": "2", "link": "https://finance.yahoo.com/b"},
                {"uuid": "3", "title": "Chip stocks slide"}
            ]
        }"#;

        let search: SearchResponse = serde_json::from_str(body).unwrap();
        let headlines = parse_headlines(search);

        assert_eq!(
            headlines,
            vec![
                Headline::new("Nvidia beats estimates", "https://finance.yahoo.com/a"),
                Headline::new("No Title", "https://finance.yahoo.com/b"),
                Headline::new("Chip stocks slide", "#"),
            ]
        );
    }

    #[test]
    fn test_parse_response_without_news() {
        let search: SearchResponse = serde_json::from_str(r#"{"quotes": []}"#).unwrap();
        assert!(parse_headlines(search).is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_an_error() {
        let client = YahooNewsClient::new("http://127.0.0.1:9", 10, Some(5)).unwrap();
        let err = client.headlines("NVDA").await.unwrap_err();
        assert!(err.to_string().contains("Failed to send news request"));
    }
}
