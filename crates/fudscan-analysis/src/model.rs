//! Domain Models
//!
//! Data fetched from upstream sources and fed to the agent's tools.
//! Uses `rust_decimal` for all monetary values - never use f64 for money!
//! Close-price series used for indicator math stay f64 (analytics, not
//! accounting).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A news headline about a coin, with per-article sentiment
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewsArticle {
    /// Headline text
    pub title: String,

    /// Publisher (e.g., "CoinDesk")
    pub source: String,

    /// Canonical article URL
    pub url: String,

    /// Publication time
    pub published_at: DateTime<Utc>,

    /// Lexicon sentiment, -1.0 (bearish) to 1.0 (bullish)
    pub sentiment: f64,
}

/// A social-media post about a coin
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SocialPost {
    /// Post body
    pub text: String,

    /// Author handle
    pub author: String,

    /// Likes + reposts + replies, whatever the platform counts
    pub engagement: u64,

    /// Lexicon sentiment, -1.0 to 1.0
    pub sentiment: f64,
}

/// Point-in-time market snapshot for a coin
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Ticker symbol (e.g., "BTC")
    pub symbol: String,

    /// Current price in USD
    pub price_usd: Decimal,

    /// 24-hour price change percentage
    pub change_24h: Decimal,

    /// Market capitalization
    pub market_cap: Option<Decimal>,

    /// 24-hour trading volume in USD
    pub volume_24h: Decimal,

    /// When this snapshot was fetched
    pub fetched_at: DateTime<Utc>,
}

impl MarketSnapshot {
    pub fn new(symbol: impl Into<String>, price_usd: Decimal) -> Self {
        Self {
            symbol: symbol.into().to_uppercase(),
            price_usd,
            change_24h: Decimal::ZERO,
            market_cap: None,
            volume_24h: Decimal::ZERO,
            fetched_at: Utc::now(),
        }
    }
}

/// One daily candle, reduced to its close
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Candle {
    /// Candle timestamp (daily granularity)
    pub timestamp: DateTime<Utc>,

    /// Closing price in USD
    pub close: f64,
}

impl Candle {
    pub fn new(timestamp: DateTime<Utc>, close: f64) -> Self {
        Self { timestamp, close }
    }
}

/// Extract the close series from candles, oldest first
pub fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_snapshot_uppercases_symbol() {
        let snap = MarketSnapshot::new("btc", dec!(97500));
        assert_eq!(snap.symbol, "BTC");
    }

    #[test]
    fn test_closes_preserves_order() {
        let now = Utc::now();
        let candles = vec![
            Candle::new(now, 1.0),
            Candle::new(now, 2.0),
            Candle::new(now, 3.0),
        ];
        assert_eq!(closes(&candles), vec![1.0, 2.0, 3.0]);
    }
}
