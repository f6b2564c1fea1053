//! Agent Run Events
//!
//! Incremental events emitted by the reasoning loop while a run is in
//! progress. Consumers (the SSE relay, the CLI, tests) receive them as a
//! `Stream` and render each one as it arrives.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::pin::Pin;

use futures::Stream;

/// One step of an in-flight agent run
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// The run was accepted and has started
    RunStarted {
        run_id: String,
        question: String,
        model: String,
    },

    /// The model is producing a completion for this iteration
    Thinking { iteration: usize },

    /// A tool call was parsed and is about to execute
    ToolStarted {
        name: String,
        arguments: HashMap<String, serde_json::Value>,
    },

    /// A tool finished (successfully or not)
    ToolFinished {
        name: String,
        success: bool,
        output: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<serde_json::Value>,
    },

    /// The model produced its final answer
    Answer { content: String },

    /// The run failed
    Failed { error: String },

    /// Terminal event; nothing follows
    Done,
}

impl AgentEvent {
    /// Stable kind tag, used as the SSE `event:` field
    pub fn kind(&self) -> &'static str {
        match self {
            AgentEvent::RunStarted { .. } => "run_started",
            AgentEvent::Thinking { .. } => "thinking",
            AgentEvent::ToolStarted { .. } => "tool_started",
            AgentEvent::ToolFinished { .. } => "tool_finished",
            AgentEvent::Answer { .. } => "answer",
            AgentEvent::Failed { .. } => "failed",
            AgentEvent::Done => "done",
        }
    }

    /// Whether this event ends the stream
    pub fn is_terminal(&self) -> bool {
        matches!(self, AgentEvent::Done)
    }
}

/// Stream of events from a single agent run
pub type AgentEventStream = Pin<Box<dyn Stream<Item = AgentEvent> + Send>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_serde_tag() {
        let ev = AgentEvent::ToolStarted {
            name: "news_sentiment".into(),
            arguments: HashMap::new(),
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], ev.kind());
    }

    #[test]
    fn test_done_is_terminal() {
        assert!(AgentEvent::Done.is_terminal());
        assert!(!AgentEvent::Thinking { iteration: 1 }.is_terminal());
    }
}
