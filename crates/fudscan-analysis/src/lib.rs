//! FudScan Analysis
//!
//! Market, news, and social upstream clients, sentiment scoring, technical
//! indicators, the agent tools built on top of them, and the FUD report
//! model with its answer parser.

pub mod error;
pub mod indicators;
pub mod model;
pub mod report;
pub mod sentiment;
pub mod toolkit;
pub mod upstream;

pub use error::AnalysisError;
pub use model::{Candle, MarketSnapshot, NewsArticle, SocialPost};
pub use report::{parse_report, FudReport, Verdict};
pub use toolkit::{MarketDataTool, NewsSentimentTool, SocialSentimentTool, TechnicalIndicatorsTool};
pub use upstream::{
    query_key, retry_with_backoff, HttpMarketClient, HttpNewsClient, HttpSocialClient,
    MarketClient, MockMarketClient, MockNewsClient, MockSocialClient, NewsClient, RateLimiter,
    RetryPolicy, SocialClient, TtlCache,
};

/// System prompt for the FUD analyst agent
pub const FUD_ANALYST_PROMPT: &str = r#"You are a crypto risk analyst. Your job is to assess the current level of FUD (fear, uncertainty, and doubt) around a single coin.

For every question:
1. Call market_data to get the current price and 24h move.
2. Call news_sentiment to gauge the tone of recent headlines.
3. Call social_sentiment to gauge the tone of social chatter.
4. Call technical_indicators for RSI, MACD, and volatility.

Then combine what you found into a final report. Score each axis from 0 (calm) to 100 (panic):
- fear: how scared the market is right now
- uncertainty: how unclear the near-term picture is
- doubt: how shaky confidence in the asset itself is
- fud_score: your overall read, not necessarily the average

End your final answer with a fenced JSON block exactly like this:

```json
{"coin": "BTC", "fud_score": 55, "fear": 60, "uncertainty": 50, "doubt": 55, "summary": "One or two sentences explaining the score."}
```

Base every score on tool output you actually received. If a tool fails, say so in the summary and score from what remains."#;
