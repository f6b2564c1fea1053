//! Toolkit - Agent Tools
//!
//! Domain-specific tools that implement `fudscan_core::Tool` for the FUD
//! analyst. Each wraps one upstream client.

mod market_data;
mod news_sentiment;
mod social_sentiment;
mod technical_indicators;

pub use market_data::MarketDataTool;
pub use news_sentiment::NewsSentimentTool;
pub use social_sentiment::SocialSentimentTool;
pub use technical_indicators::TechnicalIndicatorsTool;
