//! Social-Media Clients
//!
//! `HttpSocialClient` talks to a generic social-aggregator endpoint
//! (`GET {base}/posts?q=<coin>&limit=<n>`). `MockSocialClient` serves canned
//! posts for tests and keyless demo runs.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{RateLimiter, RetryPolicy, SocialClient, TtlCache, query_key, retry_with_backoff};
use crate::error::{AnalysisError, Result};
use crate::model::SocialPost;
use crate::sentiment;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const CACHE_TTL: Duration = Duration::from_secs(180);
const RATE_LIMIT: (usize, Duration) = (30, Duration::from_secs(60));

/// HTTP client for a social-aggregator API
pub struct HttpSocialClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    limiter: RateLimiter,
    retry: RetryPolicy,
    cache: TtlCache<Vec<SocialPost>>,
}

impl HttpSocialClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key,
            limiter: RateLimiter::new(RATE_LIMIT.0, RATE_LIMIT.1),
            retry: RetryPolicy::default(),
            cache: TtlCache::new(CACHE_TTL),
        })
    }

    async fn fetch_once(&self, coin: &str, limit: usize) -> Result<Vec<SocialPost>> {
        let url = format!("{}/posts", self.base_url);
        let mut request = self
            .client
            .get(&url)
            .query(&[("q", coin), ("limit", &limit.to_string())]);

        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AnalysisError::Upstream {
                source_name: "social".into(),
                status: status.as_u16(),
            });
        }

        let body: SocialResponse = response.json().await?;

        Ok(body
            .posts
            .into_iter()
            .map(|p| SocialPost {
                sentiment: sentiment::score(&p.text),
                text: p.text,
                author: p.author,
                engagement: p.engagement,
            })
            .collect())
    }
}

#[async_trait]
impl SocialClient for HttpSocialClient {
    async fn posts(&self, coin: &str, limit: usize) -> Result<Vec<SocialPost>> {
        let key = query_key(&[coin, &limit.to_string()]);

        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!(coin, "Social cache hit");
            return Ok(hit);
        }

        self.limiter.acquire().await;
        let posts = retry_with_backoff(&self.retry, || self.fetch_once(coin, limit)).await?;

        self.cache.insert(key, posts.clone());
        Ok(posts)
    }

    fn name(&self) -> &str {
        "social"
    }
}

#[derive(Debug, Deserialize)]
struct SocialResponse {
    #[serde(default)]
    posts: Vec<RawPost>,
}

#[derive(Debug, Deserialize)]
struct RawPost {
    text: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    engagement: u64,
}

/// Static posts for tests and keyless demo runs
pub struct MockSocialClient;

#[async_trait]
impl SocialClient for MockSocialClient {
    async fn posts(&self, coin: &str, limit: usize) -> Result<Vec<SocialPost>> {
        let coin = coin.to_uppercase();
        let canned: Vec<(&str, &str, u64)> = match coin.as_str() {
            "BTC" => vec![
                ("BTC holding strong, accumulation zone imo", "hodler_99", 420),
                ("Everyone I know is scared of a crash right now", "trader_jane", 1337),
                ("Institutional adoption keeps growing, bullish", "macro_mike", 256),
            ],
            "DOGE" => vec![
                ("DOGE to the moon!!!", "shibe_army", 9000),
                ("This pump smells like a rug, be careful", "skeptic_sam", 150),
                ("Why is DOGE up 12%? No news at all. Pure fear of missing out", "quant_quinn", 800),
            ],
            _ => vec![
                ("Quiet day for altcoins, volume is dead", "chart_watcher", 42),
            ],
        };

        Ok(canned
            .into_iter()
            .take(limit)
            .map(|(text, author, engagement)| SocialPost {
                text: text.into(),
                author: author.into(),
                engagement,
                sentiment: sentiment::score(text),
            })
            .collect())
    }

    fn name(&self) -> &str {
        "mock-social"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_posts() {
        let client = MockSocialClient;
        let posts = client.posts("DOGE", 10).await.unwrap();
        assert!(posts.len() >= 2);
        assert!(posts.iter().any(|p| p.engagement > 0));
    }

    #[tokio::test]
    async fn test_mock_respects_limit() {
        let client = MockSocialClient;
        let posts = client.posts("BTC", 2).await.unwrap();
        assert_eq!(posts.len(), 2);
    }
}
