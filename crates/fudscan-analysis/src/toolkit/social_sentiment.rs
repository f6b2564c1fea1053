//! Social Sentiment Tool
//!
//! Fetches recent posts and computes an engagement-weighted sentiment score.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use fudscan_core::{
    Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema,
    tool::ParameterSchema,
};

use crate::sentiment;
use crate::upstream::SocialClient;

const DEFAULT_LIMIT: u64 = 25;

/// Tool for summarizing social-media sentiment around a coin
pub struct SocialSentimentTool {
    social: Arc<dyn SocialClient>,
}

impl SocialSentimentTool {
    pub fn new(social: Arc<dyn SocialClient>) -> Self {
        Self { social }
    }
}

#[async_trait]
impl Tool for SocialSentimentTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "social_sentiment".into(),
            description: "Fetch recent social-media posts for a coin and compute an engagement-weighted sentiment score from -1.0 (fearful) to 1.0 (euphoric), with sample posts.".into(),
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
                    description: "Maximum posts to fetch".into(),
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

        let posts = match self.social.posts(&coin, limit).await {
            Ok(p) => p,
            Err(e) => return Ok(ToolResult::failure("social_sentiment", e.to_string())),
        };

        if posts.is_empty() {
            return Ok(ToolResult::failure(
                "social_sentiment",
                format!("No recent posts found for {}", coin),
            ));
        }

        // High-engagement posts drive the crowd mood; weight by log so a
        // single viral post can't completely bury the rest.
        let mut weighted = 0.0;
        let mut total_weight = 0.0;
        for post in &posts {
            let weight = 1.0 + (1.0 + post.engagement as f64).ln();
            weighted += post.sentiment * weight;
            total_weight += weight;
        }
        let score = weighted / total_weight;

        let mut output = format!(
            "Social sentiment for {}: {:.2} ({}) across {} posts\n",
            coin,
            score,
            sentiment::label(score),
            posts.len()
        );

        let mut by_engagement: Vec<_> = posts.iter().collect();
        by_engagement.sort_by(|a, b| b.engagement.cmp(&a.engagement));

        output.push_str("Loudest posts:\n");
        for post in by_engagement.iter().take(3) {
            output.push_str(&format!(
                "  - \"{}\" (@{}, {} engagements) [{:.2}]\n",
                post.text, post.author, post.engagement, post.sentiment
            ));
        }

        let data = json!({
            "coin": coin,
            "score": score,
            "label": sentiment::label(score),
            "post_count": posts.len(),
            "top_posts": by_engagement.iter().take(5).map(|p| json!({
                "text": p.text,
                "author": p.author,
                "engagement": p.engagement,
                "sentiment": p.sentiment,
            })).collect::<Vec<_>>(),
        });

        Ok(ToolResult::success("social_sentiment", output.trim()).with_data(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::MockSocialClient;
    use std::collections::HashMap;

    fn call_for(coin: &str) -> ToolCall {
        let mut arguments = HashMap::new();
        arguments.insert("coin".to_string(), json!(coin));
        ToolCall {
            name: "social_sentiment".into(),
            arguments,
            id: None,
        }
    }

    #[tokio::test]
    async fn test_weighted_score_in_range() {
        let tool = SocialSentimentTool::new(Arc::new(MockSocialClient));
        let result = tool.execute(&call_for("DOGE")).await.unwrap();

        assert!(result.success);
        let score = result.data.unwrap()["score"].as_f64().unwrap();
        assert!((-1.0..=1.0).contains(&score));
    }

    #[tokio::test]
    async fn test_output_lists_loud_posts() {
        let tool = SocialSentimentTool::new(Arc::new(MockSocialClient));
        let result = tool.execute(&call_for("BTC")).await.unwrap();
        assert!(result.output.contains("Loudest posts"));
    }
}
