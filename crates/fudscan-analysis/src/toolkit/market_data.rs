//! Market Data Tool
//!
//! Fetches the current market snapshot for a coin.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use fudscan_core::{
    Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema,
    tool::ParameterSchema,
};

use crate::upstream::MarketClient;

/// Tool for looking up current market data
pub struct MarketDataTool {
    market: Arc<dyn MarketClient>,
}

impl MarketDataTool {
    pub fn new(market: Arc<dyn MarketClient>) -> Self {
        Self { market }
    }
}

#[async_trait]
impl Tool for MarketDataTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "market_data".into(),
            description: "Get current market data for a coin: price, 24h change, market cap, and 24h volume.".into(),
            parameters: vec![ParameterSchema {
                name: "coin".into(),
                param_type: "string".into(),
                description: "Ticker symbol (e.g., 'BTC')".into(),
                required: true,
                default: None,
            }],
            category: Some("market".into()),
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let coin = call.str_arg("coin", "BTC").to_uppercase();

        let snapshot = match self.market.snapshot(&coin).await {
            Ok(s) => s,
            Err(e) => return Ok(ToolResult::failure("market_data", e.to_string())),
        };

        let mut output = format!(
            "{}: ${} ({:+}% 24h)\n",
            snapshot.symbol, snapshot.price_usd, snapshot.change_24h
        );
        if let Some(cap) = snapshot.market_cap {
            output.push_str(&format!("Market cap: ${}\n", cap));
        }
        output.push_str(&format!("24h volume: ${}", snapshot.volume_24h));

        let data = json!({
            "coin": snapshot.symbol,
            "price_usd": snapshot.price_usd,
            "change_24h": snapshot.change_24h,
            "market_cap": snapshot.market_cap,
            "volume_24h": snapshot.volume_24h,
        });

        Ok(ToolResult::success("market_data", output).with_data(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::MockMarketClient;
    use std::collections::HashMap;

    fn call_for(coin: &str) -> ToolCall {
        let mut arguments = HashMap::new();
        arguments.insert("coin".to_string(), json!(coin));
        ToolCall {
            name: "market_data".into(),
            arguments,
            id: None,
        }
    }

    #[tokio::test]
    async fn test_snapshot_output() {
        let tool = MarketDataTool::new(Arc::new(MockMarketClient));
        let result = tool.execute(&call_for("btc")).await.unwrap();

        assert!(result.success);
        assert!(result.output.starts_with("BTC: $"));
        assert!(result.data.unwrap()["price_usd"].is_string());
    }

    #[tokio::test]
    async fn test_unknown_coin_fails_softly() {
        let tool = MarketDataTool::new(Arc::new(MockMarketClient));
        let result = tool.execute(&call_for("NOTREAL")).await.unwrap();
        // Upstream errors become failed results fed back to the model
        assert!(!result.success);
    }
}
