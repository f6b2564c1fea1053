//! News Clients
//!
//! `HttpNewsClient` talks to a NewsAPI-compatible endpoint. `MockNewsClient`
//! serves canned headlines for tests and keyless demo runs.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{NewsClient, RateLimiter, RetryPolicy, TtlCache, query_key, retry_with_backoff};
use crate::error::{AnalysisError, Result};
use crate::model::NewsArticle;
use crate::sentiment;

const DEFAULT_BASE_URL: &str = "https://newsapi.org/v2";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const CACHE_TTL: Duration = Duration::from_secs(300);
// NewsAPI free tier is generous per-day but tight per-burst
const RATE_LIMIT: (usize, Duration) = (10, Duration::from_secs(60));

/// NewsAPI-compatible HTTP client
pub struct HttpNewsClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    limiter: RateLimiter,
    retry: RetryPolicy,
    cache: TtlCache<Vec<NewsArticle>>,
}

impl HttpNewsClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            limiter: RateLimiter::new(RATE_LIMIT.0, RATE_LIMIT.1),
            retry: RetryPolicy::default(),
            cache: TtlCache::new(CACHE_TTL),
        })
    }

    async fn fetch_once(&self, coin: &str, limit: usize) -> Result<Vec<NewsArticle>> {
        let url = format!("{}/everything", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", coin),
                ("sortBy", "publishedAt"),
                ("pageSize", &limit.to_string()),
                ("apiKey", &self.api_key),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalysisError::Upstream {
                source_name: "newsapi".into(),
                status: status.as_u16(),
            });
        }

        let body: NewsApiResponse = response.json().await?;

        Ok(body
            .articles
            .into_iter()
            .map(|a| {
                let text = match &a.description {
                    Some(d) => format!("{} {}", a.title, d),
                    None => a.title.clone(),
                };
                NewsArticle {
                    sentiment: sentiment::score(&text),
                    title: a.title,
                    source: a.source.name,
                    url: a.url,
                    published_at: parse_timestamp(&a.published_at),
                }
            })
            .collect())
    }
}

#[async_trait]
impl NewsClient for HttpNewsClient {
    async fn headlines(&self, coin: &str, limit: usize) -> Result<Vec<NewsArticle>> {
        let key = query_key(&[coin, &limit.to_string()]);

        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!(coin, "News cache hit");
            return Ok(hit);
        }

        self.limiter.acquire().await;
        let articles = retry_with_backoff(&self.retry, || self.fetch_once(coin, limit)).await?;

        self.cache.insert(key, articles.clone());
        Ok(articles)
    }

    fn name(&self) -> &str {
        "newsapi"
    }
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    #[serde(default)]
    articles: Vec<RawArticle>,
}

#[derive(Debug, Deserialize)]
struct RawArticle {
    title: String,
    #[serde(default)]
    description: Option<String>,
    url: String,
    #[serde(rename = "publishedAt")]
    published_at: String,
    source: RawSource,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    name: String,
}

/// Static headlines for tests and keyless demo runs
pub struct MockNewsClient;

#[async_trait]
impl NewsClient for MockNewsClient {
    async fn headlines(&self, coin: &str, limit: usize) -> Result<Vec<NewsArticle>> {
        let coin = coin.to_uppercase();
        let canned: Vec<(&str, &str)> = match coin.as_str() {
            "BTC" => vec![
                ("Bitcoin rally stalls as ETF inflows slow", "CoinDesk"),
                ("Miners accumulate ahead of difficulty adjustment", "The Block"),
                ("Analysts warn of liquidation cascade risk near support", "Cointelegraph"),
            ],
            "ETH" => vec![
                ("Ethereum upgrade ships on schedule", "CoinDesk"),
                ("Staking withdrawals spark selloff fear", "Decrypt"),
            ],
            "DOGE" => vec![
                ("Dogecoin pumps on social media frenzy", "Decrypt"),
                ("Exchange warns of meme coin liquidation risk", "CoinDesk"),
                ("Regulator opens investigation into meme token promotions", "Reuters"),
            ],
            _ => vec![(
                "Altcoin market drifts sideways amid low volume",
                "CoinDesk",
            )],
        };

        Ok(canned
            .into_iter()
            .take(limit)
            .map(|(title, source)| NewsArticle {
                title: title.into(),
                source: source.into(),
                url: format!("https://example.com/{}", coin.to_lowercase()),
                published_at: Utc::now(),
                sentiment: sentiment::score(title),
            })
            .collect())
    }

    fn name(&self) -> &str {
        "mock-news"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_headlines() {
        let client = MockNewsClient;
        let articles = client.headlines("BTC", 10).await.unwrap();
        assert!(!articles.is_empty());
        assert!(articles.iter().any(|a| a.sentiment != 0.0));
    }

    #[tokio::test]
    async fn test_mock_respects_limit() {
        let client = MockNewsClient;
        let articles = client.headlines("DOGE", 1).await.unwrap();
        assert_eq!(articles.len(), 1);
    }

    #[test]
    fn test_timestamp_fallback() {
        // Bad timestamps degrade to "now" rather than failing the fetch
        let parsed = parse_timestamp("not-a-date");
        assert!(parsed <= Utc::now());
    }
}
