//! Upstream Data Sources
//!
//! One client per external API the agent's tools draw on: news, social
//! media, and market data. Every HTTP client shares the same plumbing — a
//! sliding-window rate limiter, retry with exponential backoff, and a TTL
//! result cache consulted before the limiter.

mod cache;
mod limiter;
mod market;
mod news;
mod retry;
mod social;

pub use cache::{TtlCache, query_key};
pub use limiter::RateLimiter;
pub use market::{HttpMarketClient, MockMarketClient};
pub use news::{HttpNewsClient, MockNewsClient};
pub use retry::{RetryPolicy, retry_with_backoff};
pub use social::{HttpSocialClient, MockSocialClient};

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{Candle, MarketSnapshot, NewsArticle, SocialPost};

/// News source (Strategy pattern)
///
/// Implement this for each provider: NewsAPI, CryptoPanic, etc.
#[async_trait]
pub trait NewsClient: Send + Sync {
    /// Recent headlines mentioning the coin, newest first
    async fn headlines(&self, coin: &str, limit: usize) -> Result<Vec<NewsArticle>>;

    /// Check if the source is reachable
    async fn health_check(&self) -> bool {
        true
    }

    /// Source name
    fn name(&self) -> &str;
}

/// Social-media source
#[async_trait]
pub trait SocialClient: Send + Sync {
    /// Recent posts mentioning the coin
    async fn posts(&self, coin: &str, limit: usize) -> Result<Vec<SocialPost>>;

    /// Check if the source is reachable
    async fn health_check(&self) -> bool {
        true
    }

    /// Source name
    fn name(&self) -> &str;
}

/// Market-data source
///
/// Implement this for each provider: CoinGecko, CoinMarketCap, etc.
#[async_trait]
pub trait MarketClient: Send + Sync {
    /// Current price, 24h change, market cap, and volume
    async fn snapshot(&self, coin: &str) -> Result<MarketSnapshot>;

    /// Daily close candles for the last `days` days, oldest first
    async fn candles(&self, coin: &str, days: u32) -> Result<Vec<Candle>>;

    /// Check if the source is reachable
    async fn health_check(&self) -> bool {
        true
    }

    /// Source name
    fn name(&self) -> &str;
}
