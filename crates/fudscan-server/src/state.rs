//! Application State

use std::sync::Arc;

use fudscan_core::{LlmProvider, ToolRegistry};

/// Which upstream data sources are backed by live APIs vs mock data
#[derive(Clone, Copy, Debug)]
pub struct UpstreamStatus {
    pub news_live: bool,
    pub social_live: bool,
    pub market_live: bool,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// LLM provider (Ollama, etc.)
    pub provider: Arc<dyn LlmProvider>,

    /// Tool registry with all available tools
    pub tools: Arc<ToolRegistry>,

    /// Live/mock status per upstream, reported by /health
    pub upstreams: UpstreamStatus,
}
