//! fudscan HTTP Server
//!
//! Axum-based server exposing the FUD analyst agent over REST and SSE.
//! Upstream data sources (news, social, market) run against live APIs when
//! configured, and fall back to deterministic mock clients otherwise.

mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fudscan_analysis::{
    HttpMarketClient, HttpNewsClient, HttpSocialClient, MarketClient, MarketDataTool,
    MockMarketClient, MockNewsClient, MockSocialClient, NewsClient, NewsSentimentTool,
    SocialClient, SocialSentimentTool, TechnicalIndicatorsTool,
};
use fudscan_core::{LlmProvider, ToolRegistry};
use fudscan_runtime::OllamaProvider;

use crate::handlers::{health_check, list_models, report_handler, report_stream_handler};
use crate::state::{AppState, UpstreamStatus};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    // Initialize LLM provider
    let provider = Arc::new(OllamaProvider::from_env());

    // Verify Ollama connection
    match provider.health_check().await {
        Ok(true) => {
            tracing::info!("✓ Connected to Ollama");
            if let Ok(models) = provider.list_models().await {
                for model in models {
                    tracing::info!("  Model: {}", model.id);
                }
            }
        }
        Ok(false) | Err(_) => {
            tracing::warn!("⚠ Ollama not available - agent runs will fail");
            tracing::warn!("  Make sure Ollama is running: ollama serve");
        }
    }

    // Wire upstream clients: live when configured, mock otherwise
    let (news, news_live): (Arc<dyn NewsClient>, bool) = match std::env::var("NEWS_API_KEY") {
        Ok(key) if !key.is_empty() => (Arc::new(HttpNewsClient::new(key)?), true),
        _ => (Arc::new(MockNewsClient), false),
    };

    let (social, social_live): (Arc<dyn SocialClient>, bool) =
        match std::env::var("SOCIAL_API_BASE") {
            Ok(base) if !base.is_empty() => (
                Arc::new(HttpSocialClient::new(
                    base,
                    std::env::var("SOCIAL_API_KEY").ok(),
                )?),
                true,
            ),
            _ => (Arc::new(MockSocialClient), false),
        };

    let (market, market_live): (Arc<dyn MarketClient>, bool) =
        match std::env::var("MARKET_API_BASE") {
            Ok(base) if !base.is_empty() => {
                (Arc::new(HttpMarketClient::with_base_url(base)?), true)
            }
            _ => (Arc::new(MockMarketClient), false),
        };

    if !news_live {
        tracing::warn!("⚠ NEWS_API_KEY not set - news_sentiment uses mock headlines");
    }
    if !social_live {
        tracing::warn!("⚠ SOCIAL_API_BASE not set - social_sentiment uses mock posts");
    }
    if !market_live {
        tracing::warn!("⚠ MARKET_API_BASE not set - market tools use mock data");
    }

    // Initialize tools
    let mut tools = ToolRegistry::new();
    tools.register(NewsSentimentTool::new(news));
    tools.register(SocialSentimentTool::new(social));
    tools.register(MarketDataTool::new(market.clone()));
    tools.register(TechnicalIndicatorsTool::new(market));

    tracing::info!("Registered {} tools:", tools.len());
    for name in tools.names() {
        tracing::info!("  • {}", name);
    }

    // Build application state
    let state = AppState {
        provider,
        tools: Arc::new(tools),
        upstreams: UpstreamStatus {
            news_live,
            social_live,
            market_live,
        },
    };

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        .route("/health", get(health_check))
        .route("/api/models", get(list_models))
        .route("/api/report", post(report_handler))
        .route("/api/report/stream", get(report_stream_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 fudscan server running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health            - Health check");
    tracing::info!("  GET  /api/models        - List available models");
    tracing::info!("  POST /api/report        - Generate a FUD report");
    tracing::info!("  GET  /api/report/stream - Stream agent events (SSE)");
    tracing::info!("");

    axum::serve(listener, app).await?;

    Ok(())
}
