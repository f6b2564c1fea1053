//! News Sentiment Tool
//!
//! Fetches recent headlines and aggregates per-article sentiment.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use fudscan_core::{
    Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema,
    tool::ParameterSchema,
};

use crate::sentiment;
use crate::upstream::NewsClient;

const DEFAULT_LIMIT: u64 = 15;

/// Tool for summarizing news sentiment around a coin
pub struct NewsSentimentTool {
    news: Arc<dyn NewsClient>,
}

impl NewsSentimentTool {
    pub fn new(news: Arc<dyn NewsClient>) -> Self {
        Self { news }
    }
}

#[async_trait]
impl Tool for NewsSentimentTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "news_sentiment".into(),
            description: "Fetch recent news headlines for a coin and aggregate their sentiment. Returns an overall score from -1.0 (bearish) to 1.0 (bullish) and the most negative headlines.".into(),
            parameters: vec![
                ParameterSchema {
                    name: "coin".into(),
                    param_type: "string".into(),
                    description: "Ticker symbol (e.g., 'BTC')".into(),
                    required: true,
                    default: None,
                },
                ParameterSchema {
                    name: "limit".into(),
                    param_type: "number".into(),
                    description: "Maximum headlines to fetch".into(),
                    required: false,
                    default: Some(json!(DEFAULT_LIMIT)),
                },
            ],
            category: Some("sentiment".into()),
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let coin = call.str_arg("coin", "BTC").to_uppercase();
        let limit = call.int_arg("limit", DEFAULT_LIMIT) as usize;

        let articles = match self.news.headlines(&coin, limit).await {
            Ok(a) => a,
            Err(e) => return Ok(ToolResult::failure("news_sentiment", e.to_string())),
        };

        if articles.is_empty() {
            return Ok(ToolResult::failure(
                "news_sentiment",
                format!("No recent news found for {}", coin),
            ));
        }

        let score =
            articles.iter().map(|a| a.sentiment).sum::<f64>() / articles.len() as f64;

        let mut negative: Vec<_> = articles.iter().filter(|a| a.sentiment < 0.0).collect();
        negative.sort_by(|a, b| a.sentiment.total_cmp(&b.sentiment));

        let mut output = format!(
            "News sentiment for {}: {:.2} ({}) across {} headlines\n",
            coin,
            score,
            sentiment::label(score),
            articles.len()
        );

        if negative.is_empty() {
            output.push_str("No negative headlines in the sample.\n");
        } else {
            output.push_str("Most negative headlines:\n");
            for article in negative.iter().take(3) {
                output.push_str(&format!(
                    "  - {} ({}) [{:.2}]\n",
                    article.title, article.source, article.sentiment
                ));
            }
        }

        let data = json!({
            "coin": coin,
            "score": score,
            "label": sentiment::label(score),
            "article_count": articles.len(),
            "headlines": articles.iter().map(|a| json!({
                "title": a.title,
                "source": a.source,
                "sentiment": a.sentiment,
            })).collect::<Vec<_>>(),
        });

        Ok(ToolResult::success("news_sentiment", output.trim()).with_data(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::MockNewsClient;
    use std::collections::HashMap;

    fn call_for(coin: &str) -> ToolCall {
        let mut arguments = HashMap::new();
        arguments.insert("coin".to_string(), json!(coin));
        ToolCall {
            name: "news_sentiment".into(),
            arguments,
            id: None,
        }
    }

    #[tokio::test]
    async fn test_aggregates_mock_headlines() {
        let tool = NewsSentimentTool::new(Arc::new(MockNewsClient));
        let result = tool.execute(&call_for("DOGE")).await.unwrap();

        assert!(result.success);
        assert!(result.output.contains("News sentiment for DOGE"));

        let data = result.data.unwrap();
        assert!(data["article_count"].as_u64().unwrap() > 0);
        assert!(data["score"].is_number());
    }

    #[tokio::test]
    async fn test_negative_coverage_surfaces_headlines() {
        let tool = NewsSentimentTool::new(Arc::new(MockNewsClient));
        let result = tool.execute(&call_for("DOGE")).await.unwrap();
        assert!(result.output.contains("Most negative headlines"));
    }
}
