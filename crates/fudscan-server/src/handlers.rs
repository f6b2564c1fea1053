//! HTTP/SSE Handlers

use std::convert::Infallible;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use fudscan_analysis::{parse_report, FudReport, FUD_ANALYST_PROMPT};
use fudscan_core::{
    event::AgentEvent,
    provider::GenerationOptions,
    reasoning::{Agent, AgentConfig},
};

use crate::state::AppState;

const DEFAULT_MODEL: &str = "llama3.2";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub ollama_connected: bool,
    pub news_live: bool,
    pub social_live: bool,
    pub market_live: bool,
}

#[derive(Serialize)]
pub struct ModelsResponse {
    pub models: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    pub coin: String,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub report: Option<FudReport>,
    pub raw: String,
    pub run_id: String,
    pub model: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct StreamParams {
    pub coin: String,
    #[serde(default)]
    pub model: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let ollama_connected = state.provider.health_check().await.unwrap_or(false);

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        ollama_connected,
        news_live: state.upstreams.news_live,
        social_live: state.upstreams.social_live,
        market_live: state.upstreams.market_live,
    })
}

/// List models available on the provider
pub async fn list_models(
    State(state): State<AppState>,
) -> Result<Json<ModelsResponse>, (StatusCode, Json<ErrorResponse>)> {
    let models = state.provider.list_models().await.map_err(|e| {
        tracing::error!("Model listing failed: {}", e);
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: e.user_message(),
                code: "PROVIDER_UNAVAILABLE".into(),
            }),
        )
    })?;

    Ok(Json(ModelsResponse {
        models: models.into_iter().map(|m| m.id).collect(),
    }))
}

/// One-shot report endpoint: run the agent to completion, parse the answer
pub async fn report_handler(
    State(state): State<AppState>,
    Json(payload): Json<ReportRequest>,
) -> Result<Json<ReportResponse>, (StatusCode, Json<ErrorResponse>)> {
    let coin = payload.coin.trim().to_uppercase();
    if coin.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Coin symbol is required".into(),
                code: "MISSING_COIN".into(),
            }),
        ));
    }

    let model = payload.model.unwrap_or_else(|| DEFAULT_MODEL.into());
    let agent = build_agent(&state, &model);
    let run_id = uuid::Uuid::new_v4().to_string();

    tracing::info!(run_id = %run_id, coin = %coin, model = %model, "Starting report run");

    let answer = agent.ask(&report_question(&coin)).await.map_err(|e| {
        tracing::error!(run_id = %run_id, "Agent error: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.user_message(),
                code: "AGENT_ERROR".into(),
            }),
        )
    })?;

    let report = parse_report(&coin, &answer);
    if report.is_none() {
        tracing::warn!(run_id = %run_id, "Answer contained no parseable scores");
    }

    Ok(Json(ReportResponse {
        report,
        raw: answer,
        run_id,
        model,
    }))
}

/// Streaming report endpoint: relay agent events over SSE
///
/// Every `AgentEvent` becomes one SSE event named after its kind. When the
/// agent produces its final answer, a parsed `report` event is emitted just
/// before the `answer` event so clients get structure without re-parsing.
pub async fn report_stream_handler(
    State(state): State<AppState>,
    Query(params): Query<StreamParams>,
) -> Sse<ReceiverStream<Result<Event, Infallible>>> {
    let coin = params.coin.trim().to_uppercase();
    let model = params.model.unwrap_or_else(|| DEFAULT_MODEL.into());

    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(32);

    if coin.is_empty() {
        let _ = tx
            .try_send(Ok(sse_event(&AgentEvent::Failed {
                error: "Coin symbol is required".into(),
            })));
        let _ = tx.try_send(Ok(sse_event(&AgentEvent::Done)));
        return Sse::new(ReceiverStream::new(rx)).keep_alive(KeepAlive::default());
    }

    let agent = build_agent(&state, &model);
    let question = report_question(&coin);

    tokio::spawn(async move {
        let mut events = agent.stream(&question);

        while let Some(event) = events.next().await {
            if let AgentEvent::Answer { content } = &event {
                if let Some(report) = parse_report(&coin, content) {
                    let report_event = Event::default()
                        .event("report")
                        .json_data(&report)
                        .unwrap_or_else(|_| Event::default().event("report"));
                    if tx.send(Ok(report_event)).await.is_err() {
                        return;
                    }
                } else {
                    tracing::warn!(coin = %coin, "Answer contained no parseable scores");
                }
            }

            if tx.send(Ok(sse_event(&event))).await.is_err() {
                // Client went away; dropping the stream cancels the run
                return;
            }
        }
    });

    Sse::new(ReceiverStream::new(rx)).keep_alive(KeepAlive::default())
}

// ============================================================================
// Helpers
// ============================================================================

fn build_agent(state: &AppState, model: &str) -> Agent {
    let config = AgentConfig {
        system_prompt: FUD_ANALYST_PROMPT.into(),
        generation: GenerationOptions {
            model: model.into(),
            ..Default::default()
        },
        ..Default::default()
    };

    Agent::new(state.provider.clone(), state.tools.clone(), config)
}

fn report_question(coin: &str) -> String {
    format!("Assess the current level of FUD around {coin} and produce a report.")
}

fn sse_event(event: &AgentEvent) -> Event {
    Event::default()
        .event(event.kind())
        .json_data(event)
        .unwrap_or_else(|_| Event::default().event(event.kind()))
}
