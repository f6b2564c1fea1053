//! Market-Data Clients
//!
//! `HttpMarketClient` talks to a CoinGecko-compatible API. `MockMarketClient`
//! serves realistic static data for tests and offline demo runs.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use serde::Deserialize;

use super::{MarketClient, RateLimiter, RetryPolicy, TtlCache, query_key, retry_with_backoff};
use crate::error::{AnalysisError, Result};
use crate::model::{Candle, MarketSnapshot};

const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const CACHE_TTL: Duration = Duration::from_secs(60);
// CoinGecko free tier allows 10-30 calls/min
const RATE_LIMIT: (usize, Duration) = (10, Duration::from_secs(60));

/// CoinGecko-compatible HTTP client
pub struct HttpMarketClient {
    client: reqwest::Client,
    base_url: String,
    limiter: RateLimiter,
    retry: RetryPolicy,
    snapshots: TtlCache<MarketSnapshot>,
    candle_cache: TtlCache<Vec<Candle>>,
}

impl HttpMarketClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            limiter: RateLimiter::new(RATE_LIMIT.0, RATE_LIMIT.1),
            retry: RetryPolicy::default(),
            snapshots: TtlCache::new(CACHE_TTL),
            candle_cache: TtlCache::new(CACHE_TTL),
        })
    }

    async fn fetch_snapshot(&self, symbol: &str, id: &str) -> Result<MarketSnapshot> {
        let url = format!("{}/coins/{}", self.base_url, id);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("localization", "false"),
                ("tickers", "false"),
                ("community_data", "false"),
                ("developer_data", "false"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalysisError::Upstream {
                source_name: "coingecko".into(),
                status: status.as_u16(),
            });
        }

        let body: CoinResponse = response.json().await?;
        let market = body.market_data;

        Ok(MarketSnapshot {
            symbol: symbol.to_uppercase(),
            price_usd: to_decimal(market.current_price.usd),
            change_24h: to_decimal(market.price_change_percentage_24h.unwrap_or(0.0)),
            market_cap: market.market_cap.and_then(|c| c.usd.map(to_decimal)),
            volume_24h: to_decimal(market.total_volume.usd),
            fetched_at: Utc::now(),
        })
    }

    async fn fetch_candles(&self, id: &str, days: u32) -> Result<Vec<Candle>> {
        let url = format!("{}/coins/{}/market_chart", self.base_url, id);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("vs_currency", "usd"),
                ("days", &days.to_string()),
                ("interval", "daily"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalysisError::Upstream {
                source_name: "coingecko".into(),
                status: status.as_u16(),
            });
        }

        let body: MarketChartResponse = response.json().await?;

        Ok(body
            .prices
            .into_iter()
            .filter_map(|point| {
                let [ts_ms, price] = point;
                let timestamp = DateTime::from_timestamp_millis(ts_ms as i64)?;
                Some(Candle::new(timestamp, price))
            })
            .collect())
    }
}

#[async_trait]
impl MarketClient for HttpMarketClient {
    async fn snapshot(&self, coin: &str) -> Result<MarketSnapshot> {
        let id = coin_id(coin)?;
        let key = query_key(&["snapshot", &id]);

        if let Some(hit) = self.snapshots.get(&key) {
            tracing::debug!(coin, "Market snapshot cache hit");
            return Ok(hit);
        }

        self.limiter.acquire().await;
        let snapshot =
            retry_with_backoff(&self.retry, || self.fetch_snapshot(coin, &id)).await?;

        self.snapshots.insert(key, snapshot.clone());
        Ok(snapshot)
    }

    async fn candles(&self, coin: &str, days: u32) -> Result<Vec<Candle>> {
        let id = coin_id(coin)?;
        let key = query_key(&["candles", &id, &days.to_string()]);

        if let Some(hit) = self.candle_cache.get(&key) {
            tracing::debug!(coin, "Candle cache hit");
            return Ok(hit);
        }

        self.limiter.acquire().await;
        let candles = retry_with_backoff(&self.retry, || self.fetch_candles(&id, days)).await?;

        self.candle_cache.insert(key, candles.clone());
        Ok(candles)
    }

    fn name(&self) -> &str {
        "coingecko"
    }
}

/// Map a ticker symbol to a CoinGecko coin id
fn coin_id(symbol: &str) -> Result<String> {
    let id = match symbol.to_uppercase().as_str() {
        "BTC" => "bitcoin",
        "ETH" => "ethereum",
        "SOL" => "solana",
        "ADA" => "cardano",
        "DOT" => "polkadot",
        "LINK" => "chainlink",
        "AVAX" => "avalanche-2",
        "MATIC" => "matic-network",
        "ATOM" => "cosmos",
        "XRP" => "ripple",
        "DOGE" => "dogecoin",
        "SHIB" => "shiba-inu",
        "UNI" => "uniswap",
        "LTC" => "litecoin",
        "BCH" => "bitcoin-cash",
        _ => return Err(AnalysisError::UnsupportedCoin(symbol.to_string())),
    };
    Ok(id.to_string())
}

fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64_retain(value).unwrap_or(Decimal::ZERO)
}

#[derive(Debug, Deserialize)]
struct CoinResponse {
    market_data: MarketData,
}

#[derive(Debug, Deserialize)]
struct MarketData {
    current_price: UsdQuote,
    #[serde(default)]
    price_change_percentage_24h: Option<f64>,
    #[serde(default)]
    market_cap: Option<OptionalUsdQuote>,
    total_volume: UsdQuote,
}

#[derive(Debug, Deserialize)]
struct UsdQuote {
    usd: f64,
}

#[derive(Debug, Deserialize)]
struct OptionalUsdQuote {
    usd: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct MarketChartResponse {
    #[serde(default)]
    prices: Vec<[f64; 2]>,
}

/// Static market data for tests and offline demo runs
pub struct MockMarketClient;

impl MockMarketClient {
    /// (price, 24h change %, market cap, 24h volume)
    fn base_data(symbol: &str) -> Option<(Decimal, Decimal, Decimal, Decimal)> {
        match symbol.to_uppercase().as_str() {
            "BTC" => Some((dec!(97500), dec!(2.5), dec!(1_920_000_000_000), dec!(25_000_000_000))),
            "ETH" => Some((dec!(3450), dec!(1.8), dec!(415_000_000_000), dec!(15_000_000_000))),
            "SOL" => Some((dec!(195), dec!(4.2), dec!(92_000_000_000), dec!(3_000_000_000))),
            "ADA" => Some((dec!(0.95), dec!(-1.2), dec!(33_000_000_000), dec!(800_000_000))),
            "DOGE" => Some((dec!(0.38), dec!(12.0), dec!(56_000_000_000), dec!(4_000_000_000))),
            "SHIB" => Some((dec!(0.000022), dec!(-8.0), dec!(13_000_000_000), dec!(600_000_000))),
            "XRP" => Some((dec!(2.35), dec!(0.9), dec!(134_000_000_000), dec!(5_000_000_000))),
            "LINK" => Some((dec!(24.50), dec!(3.1), dec!(15_000_000_000), dec!(700_000_000))),
            _ => None,
        }
    }
}

#[async_trait]
impl MarketClient for MockMarketClient {
    async fn snapshot(&self, coin: &str) -> Result<MarketSnapshot> {
        let (price, change, cap, volume) = Self::base_data(coin)
            .ok_or_else(|| AnalysisError::UnsupportedCoin(coin.to_string()))?;

        let mut snapshot = MarketSnapshot::new(coin, price);
        snapshot.change_24h = change;
        snapshot.market_cap = Some(cap);
        snapshot.volume_24h = volume;
        Ok(snapshot)
    }

    async fn candles(&self, coin: &str, days: u32) -> Result<Vec<Candle>> {
        let (price, _, _, _) = Self::base_data(coin)
            .ok_or_else(|| AnalysisError::UnsupportedCoin(coin.to_string()))?;

        let base = price.to_f64().unwrap_or(100.0);
        let now = Utc::now();

        // Deterministic wobble around the base price, oldest first
        Ok((0..days)
            .map(|i| {
                let age = days - 1 - i;
                let wobble = ((i as f64) * 0.7).sin() * 0.04;
                let close = base * (1.0 + wobble);
                Candle::new(now - chrono::Duration::days(age as i64), close)
            })
            .collect())
    }

    fn name(&self) -> &str {
        "mock-market"
    }
}
