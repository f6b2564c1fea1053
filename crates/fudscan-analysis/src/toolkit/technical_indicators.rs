//! Technical Indicators Tool
//!
//! Computes RSI, moving averages, MACD, and realized volatility from the
//! coin's daily close series.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use fudscan_core::{
    Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema,
    tool::ParameterSchema,
};

use crate::indicators;
use crate::model::closes;
use crate::upstream::MarketClient;

const DEFAULT_DAYS: u64 = 60;

/// Tool for computing technical indicators
pub struct TechnicalIndicatorsTool {
    market: Arc<dyn MarketClient>,
}

impl TechnicalIndicatorsTool {
    pub fn new(market: Arc<dyn MarketClient>) -> Self {
        Self { market }
    }
}

#[async_trait]
impl Tool for TechnicalIndicatorsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "technical_indicators".into(),
            description: "Compute technical indicators for a coin from daily closes: RSI(14), SMA(20), EMA(20), MACD(12,26,9), and annualized realized volatility.".into(),
            parameters: vec![
                ParameterSchema {
                    name: "coin".into(),
                    param_type: "string".into(),
                    description: "Ticker symbol (e.g., 'BTC')".into(),
                    required: true,
                    default: None,
                },
                ParameterSchema {
                    name: "days".into(),
                    param_type: "number".into(),
                    description: "Days of history to analyze".into(),
                    required: false,
                    default: Some(json!(DEFAULT_DAYS)),
                },
            ],
            category: Some("technical".into()),
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let coin = call.str_arg("coin", "BTC").to_uppercase();
        let days = call.int_arg("days", DEFAULT_DAYS) as u32;

        let candles = match self.market.candles(&coin, days).await {
            Ok(c) => c,
            Err(e) => return Ok(ToolResult::failure("technical_indicators", e.to_string())),
        };

        let series = closes(&candles);
        if series.len() < 15 {
            return Ok(ToolResult::failure(
                "technical_indicators",
                format!(
                    "Only {} daily closes available for {}, need at least 15",
                    series.len(),
                    coin
                ),
            ));
        }

        let rsi = indicators::rsi(&series, 14);
        let sma20 = indicators::sma(&series, 20);
        let ema20 = indicators::ema(&series, 20);
        let macd = indicators::macd(&series);
        let vol = indicators::volatility(&series);
        let last_close = series.last().copied().unwrap_or(0.0);

        let mut output = format!("Technical indicators for {} ({} days):\n", coin, series.len());

        if let Some(rsi) = rsi {
            output.push_str(&format!("  RSI(14):     {:.1} ({})\n", rsi, rsi_read(rsi)));
        }
        if let (Some(sma), Some(ema)) = (sma20, ema20) {
            let trend = if last_close > sma { "above" } else { "below" };
            output.push_str(&format!(
                "  SMA(20):     {:.2} (price {} average)\n",
                sma, trend
            ));
            output.push_str(&format!("  EMA(20):     {:.2}\n", ema));
        }
        if let Some(m) = macd {
            let read = if m.histogram > 0.0 {
                "bullish momentum"
            } else {
                "bearish momentum"
            };
            output.push_str(&format!(
                "  MACD:        {:.3} / signal {:.3} ({})\n",
                m.macd, m.signal, read
            ));
        }
        if let Some(vol) = vol {
            output.push_str(&format!("  Volatility:  {:.1}% annualized\n", vol));
        }

        let data = json!({
            "coin": coin,
            "days": series.len(),
            "last_close": last_close,
            "rsi_14": rsi,
            "sma_20": sma20,
            "ema_20": ema20,
            "macd": macd.map(|m| json!({
                "macd": m.macd,
                "signal": m.signal,
                "histogram": m.histogram,
            })),
            "volatility_pct": vol,
        });

        Ok(ToolResult::success("technical_indicators", output.trim()).with_data(data))
    }
}

fn rsi_read(rsi: f64) -> &'static str {
    if rsi >= 70.0 {
        "overbought"
    } else if rsi <= 30.0 {
        "oversold"
    } else {
        "neutral"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::MockMarketClient;
    use std::collections::HashMap;

    fn call_for(coin: &str, days: Option<u64>) -> ToolCall {
        let mut arguments = HashMap::new();
        arguments.insert("coin".to_string(), json!(coin));
        if let Some(days) = days {
            arguments.insert("days".to_string(), json!(days));
        }
        ToolCall {
            name: "technical_indicators".into(),
            arguments,
            id: None,
        }
    }

    #[tokio::test]
    async fn test_indicators_from_mock_candles() {
        let tool = TechnicalIndicatorsTool::new(Arc::new(MockMarketClient));
        let result = tool.execute(&call_for("BTC", None)).await.unwrap();

        assert!(result.success);
        assert!(result.output.contains("RSI(14)"));

        let data = result.data.unwrap();
        assert!(data["rsi_14"].is_number());
        assert!(data["macd"].is_object());
    }

    #[tokio::test]
    async fn test_too_little_history_fails_softly() {
        let tool = TechnicalIndicatorsTool::new(Arc::new(MockMarketClient));
        let result = tool.execute(&call_for("BTC", Some(5))).await.unwrap();
        assert!(!result.success);
        assert!(result.output.contains("need at least 15"));
    }

    #[test]
    fn test_rsi_read_bands() {
        assert_eq!(rsi_read(75.0), "overbought");
        assert_eq!(rsi_read(25.0), "oversold");
        assert_eq!(rsi_read(50.0), "neutral");
    }
}
