//! Reasoning Loop
//!
//! Implements the ReAct (Reason + Act) pattern for agent behavior.
//! The agent observes, thinks, acts (via tools), and responds. Each phase
//! is optionally reported through an `AgentEvent` channel so callers can
//! relay progress incrementally.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::{AgentError, Result};
use crate::event::{AgentEvent, AgentEventStream};
use crate::message::{Conversation, Message, Role};
use crate::provider::{GenerationOptions, LlmProvider};
use crate::tool::{ToolCall, ToolRegistry, ToolResult};

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// System prompt template
    pub system_prompt: String,

    /// Maximum reasoning iterations before giving up
    pub max_iterations: usize,

    /// Generation options
    pub generation: GenerationOptions,

    /// Whether to append tool descriptions to system prompt
    pub inject_tool_descriptions: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            max_iterations: 10,
            generation: GenerationOptions::default(),
            inject_tool_descriptions: true,
        }
    }
}

const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a helpful AI assistant.

When you need to use a tool, respond with a JSON block in this exact format:
```tool
{"tool": "tool_name", "arguments": {"arg1": "value1"}}
```

After receiving tool results, synthesize them into a helpful response.
If you can answer directly without tools, do so.
Be concise and accurate."#;

/// The main Agent struct
#[derive(Clone)]
pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    config: AgentConfig,
}

impl Agent {
    /// Create a new agent
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tools: Arc<ToolRegistry>,
        config: AgentConfig,
    ) -> Self {
        Self {
            provider,
            tools,
            config,
        }
    }

    /// Create with default configuration
    pub fn with_defaults(provider: Arc<dyn LlmProvider>, tools: Arc<ToolRegistry>) -> Self {
        Self::new(provider, tools, AgentConfig::default())
    }

    /// Build the full system prompt including tool descriptions
    fn build_system_prompt(&self) -> String {
        let mut prompt = self.config.system_prompt.clone();

        if self.config.inject_tool_descriptions && !self.tools.is_empty() {
            prompt.push_str("\n\n");
            prompt.push_str(&self.tools.generate_prompt_section());
        }

        prompt
    }

    /// Run the agent on a conversation to completion
    pub async fn run(&self, conversation: &mut Conversation) -> Result<String> {
        self.run_inner(conversation, None).await
    }

    /// Run with a simple string input (creates temporary conversation)
    pub async fn ask(&self, question: &str) -> Result<String> {
        let mut conversation = Conversation::with_system_prompt(self.build_system_prompt());
        conversation.push(Message::user(question));
        self.run(&mut conversation).await
    }

    /// Run the agent, emitting incremental events as a stream
    ///
    /// The run is spawned onto the runtime; dropping the returned stream
    /// cancels it at the next event boundary. `Done` (or `Failed` followed
    /// by `Done`) is always the last event delivered.
    pub fn stream(&self, question: impl Into<String>) -> AgentEventStream {
        let agent = self.clone();
        let question = question.into();
        let (tx, rx) = mpsc::channel(32);

        tokio::spawn(async move {
            let run_id = uuid::Uuid::new_v4().to_string();
            let started = AgentEvent::RunStarted {
                run_id,
                question: question.clone(),
                model: agent.config.generation.model.clone(),
            };
            if tx.send(started).await.is_err() {
                return;
            }

            let mut conversation =
                Conversation::with_system_prompt(agent.build_system_prompt());
            conversation.push(Message::user(&question));

            match agent.run_inner(&mut conversation, Some(&tx)).await {
                Ok(content) => {
                    if tx.send(AgentEvent::Answer { content }).await.is_err() {
                        return;
                    }
                }
                Err(AgentError::Canceled(_)) => return,
                Err(e) => {
                    tracing::error!("Agent run failed: {}", e);
                    if tx
                        .send(AgentEvent::Failed {
                            error: e.user_message(),
                        })
                        .await
                        .is_err()
                    {
                        return;
                    }
                }
            }

            let _ = tx.send(AgentEvent::Done).await;
        });

        Box::pin(ReceiverStream::new(rx))
    }

    /// The ReAct loop shared by `run` and `stream`
    async fn run_inner(
        &self,
        conversation: &mut Conversation,
        events: Option<&mpsc::Sender<AgentEvent>>,
    ) -> Result<String> {
        // Ensure system prompt is set
        if conversation.messages().first().map(|m| &m.role) != Some(&Role::System) {
            let messages = conversation.messages_mut();
            messages.insert(0, Message::system(self.build_system_prompt()));
        }

        let mut iterations = 0;

        loop {
            iterations += 1;

            if iterations > self.config.max_iterations {
                return Err(AgentError::MaxIterations(self.config.max_iterations));
            }

            Self::emit(events, AgentEvent::Thinking { iteration: iterations }).await?;

            conversation.truncate_to_fit();

            let completion = self
                .provider
                .complete(conversation.messages(), &self.config.generation)
                .await?;

            let content = completion.content.clone();
            conversation.push(Message::assistant(&content));

            // Check for tool calls
            if let Some(tool_call) = self.parse_tool_call(&content) {
                tracing::debug!(tool = %tool_call.name, "Executing tool");

                Self::emit(
                    events,
                    AgentEvent::ToolStarted {
                        name: tool_call.name.clone(),
                        arguments: tool_call.arguments.clone(),
                    },
                )
                .await?;

                let result = self.execute_tool(&tool_call).await;

                Self::emit(
                    events,
                    AgentEvent::ToolFinished {
                        name: result.name.clone(),
                        success: result.success,
                        output: result.output.clone(),
                        data: result.data.clone(),
                    },
                )
                .await?;

                let tool_message = self.format_tool_result(&result);
                conversation.push(Message::tool(tool_message, tool_call.id.clone()));

                continue;
            }

            // No tool call - this is the final response
            return Ok(content);
        }
    }

    async fn emit(events: Option<&mpsc::Sender<AgentEvent>>, event: AgentEvent) -> Result<()> {
        if let Some(tx) = events {
            tx.send(event)
                .await
                .map_err(|_| AgentError::Canceled("event receiver dropped".into()))?;
        }
        Ok(())
    }

    /// Parse a tool call from LLM response
    fn parse_tool_call(&self, content: &str) -> Option<ToolCall> {
        // Look for ```tool ... ``` blocks
        let tool_start = "```tool";
        let tool_end = "```";

        if let Some(start_idx) = content.find(tool_start) {
            let after_marker = &content[start_idx + tool_start.len()..];
            if let Some(end_idx) = after_marker.find(tool_end) {
                let json_str = after_marker[..end_idx].trim();

                if let Ok(mut call) = serde_json::from_str::<ToolCall>(json_str) {
                    if call.id.is_none() {
                        call.id = Some(uuid::Uuid::new_v4().to_string());
                    }
                    return Some(call);
                }
            }
        }

        // Fallback: try to find raw JSON with "tool" key
        self.parse_inline_tool_call(content)
    }

    /// Try to parse inline JSON tool call
    fn parse_inline_tool_call(&self, content: &str) -> Option<ToolCall> {
        if !content.contains(r#""tool""#) {
            return None;
        }

        let start = content.find('{')?;
        let end = content.rfind('}')?;

        if end <= start {
            return None;
        }

        let json_str = &content[start..=end];
        serde_json::from_str::<ToolCall>(json_str).ok()
    }

    /// Execute a tool call, folding errors into a failed result
    async fn execute_tool(&self, call: &ToolCall) -> ToolResult {
        match self.tools.execute(call).await {
            Ok(mut result) => {
                result.id = call.id.clone();
                result
            }
            Err(e) => ToolResult {
                name: call.name.clone(),
                id: call.id.clone(),
                success: false,
                output: format!("Error: {}", e),
                data: None,
            },
        }
    }

    /// Format tool result for conversation
    fn format_tool_result(&self, result: &ToolResult) -> String {
        if result.success {
            format!("[Tool '{}' returned]\n{}", result.name, result.output)
        } else {
            format!("[Tool '{}' failed]\n{}", result.name, result.output)
        }
    }

    /// Get the tool registry
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Get configuration
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }
}

/// Builder for Agent configuration
pub struct AgentBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    tools: ToolRegistry,
    config: AgentConfig,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            tools: ToolRegistry::new(),
            config: AgentConfig::default(),
        }
    }

    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn tool<T: crate::tool::Tool + 'static>(mut self, tool: T) -> Self {
        self.tools.register(tool);
        self
    }

    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.generation.model = model.into();
        self
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.config.generation.temperature = temp;
        self
    }

    pub fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    pub fn build(self) -> Result<Agent> {
        let provider = self
            .provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;

        Ok(Agent::new(provider, Arc::new(self.tools), self.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{
        Completion, CompletionStream, FinishReason, ModelInfo, ProviderInfo,
    };
    use crate::tool::{ParameterSchema, Tool, ToolSchema};
    use async_trait::async_trait;
    use futures::StreamExt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider that replays scripted completions in order
    struct ScriptedProvider {
        script: Vec<String>,
        cursor: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new(script: Vec<&str>) -> Self {
            Self {
                script: script.into_iter().map(String::from).collect(),
                cursor: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn info(&self) -> Result<ProviderInfo> {
            Ok(ProviderInfo {
                name: "Scripted".into(),
                version: None,
                models: Vec::new(),
                supports_streaming: false,
            })
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        async fn complete(
            &self,
            _messages: &[Message],
            options: &GenerationOptions,
        ) -> Result<Completion> {
            let idx = self.cursor.fetch_add(1, Ordering::SeqCst);
            let content = self
                .script
                .get(idx)
                .cloned()
                .ok_or_else(|| AgentError::Provider("script exhausted".into()))?;
            Ok(Completion {
                content,
                model: options.model.clone(),
                usage: None,
                finish_reason: Some(FinishReason::Stop),
            })
        }

        async fn complete_stream(
            &self,
            _messages: &[Message],
            _options: &GenerationOptions,
        ) -> Result<CompletionStream> {
            Err(AgentError::Provider("no streaming in tests".into()))
        }

        async fn list_models(&self) -> Result<Vec<ModelInfo>> {
            Ok(Vec::new())
        }
    }

    /// Provider whose completions after the first wait until released
    struct GatedProvider {
        reply: String,
        calls: AtomicUsize,
        gate: tokio::sync::Notify,
    }

    #[async_trait]
    impl LlmProvider for GatedProvider {
        async fn info(&self) -> Result<ProviderInfo> {
            Ok(ProviderInfo {
                name: "Gated".into(),
                version: None,
                models: Vec::new(),
                supports_streaming: false,
            })
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        async fn complete(
            &self,
            _messages: &[Message],
            options: &GenerationOptions,
        ) -> Result<Completion> {
            let idx = self.calls.fetch_add(1, Ordering::SeqCst);
            if idx > 0 {
                self.gate.notified().await;
            }
            Ok(Completion {
                content: self.reply.clone(),
                model: options.model.clone(),
                usage: None,
                finish_reason: Some(FinishReason::Stop),
            })
        }

        async fn complete_stream(
            &self,
            _messages: &[Message],
            _options: &GenerationOptions,
        ) -> Result<CompletionStream> {
            Err(AgentError::Provider("no streaming in tests".into()))
        }

        async fn list_models(&self) -> Result<Vec<ModelInfo>> {
            Ok(Vec::new())
        }
    }

    struct PingTool;

    #[async_trait]
    impl Tool for PingTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "ping".into(),
                description: "Always answers pong".into(),
                parameters: vec![ParameterSchema {
                    name: "target".into(),
                    param_type: "string".into(),
                    description: "What to ping".into(),
                    required: false,
                    default: None,
                }],
                category: None,
            }
        }

        async fn execute(&self, _call: &ToolCall) -> Result<ToolResult> {
            Ok(ToolResult::success("ping", "pong"))
        }
    }

    fn agent_with_script(script: Vec<&str>) -> Agent {
        let mut tools = ToolRegistry::new();
        tools.register(PingTool);
        Agent::new(
            Arc::new(ScriptedProvider::new(script)),
            Arc::new(tools),
            AgentConfig {
                max_iterations: 5,
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn test_direct_answer_needs_one_iteration() {
        let agent = agent_with_script(vec!["The answer is 42."]);
        let answer = agent.ask("question").await.unwrap();
        assert_eq!(answer, "The answer is 42.");
    }

    #[tokio::test]
    async fn test_tool_call_then_answer() {
        let agent = agent_with_script(vec![
            "```tool\n{\"tool\": \"ping\", \"arguments\": {}}\n```",
            "Got pong back.",
        ]);
        let answer = agent.ask("ping something").await.unwrap();
        assert_eq!(answer, "Got pong back.");
    }

    #[tokio::test]
    async fn test_max_iterations_enforced() {
        // Every completion is a tool call, so the loop can never finish
        let agent = agent_with_script(vec![
            "```tool\n{\"tool\": \"ping\", \"arguments\": {}}\n```";
            6
        ]);
        let err = agent.ask("loop forever").await.unwrap_err();
        assert!(matches!(err, AgentError::MaxIterations(5)));
    }

    #[tokio::test]
    async fn test_unknown_tool_fed_back_not_fatal() {
        let agent = agent_with_script(vec![
            "```tool\n{\"tool\": \"nope\", \"arguments\": {}}\n```",
            "Recovered without the tool.",
        ]);
        let answer = agent.ask("try a bad tool").await.unwrap();
        assert_eq!(answer, "Recovered without the tool.");
    }

    #[tokio::test]
    async fn test_stream_event_ordering() {
        let agent = agent_with_script(vec![
            "```tool\n{\"tool\": \"ping\", \"arguments\": {}}\n```",
            "done thinking",
        ]);

        let events: Vec<AgentEvent> = agent.stream("check BTC").collect().await;
        let kinds: Vec<&str> = events.iter().map(|e| e.kind()).collect();

        assert_eq!(
            kinds,
            vec![
                "run_started",
                "thinking",
                "tool_started",
                "tool_finished",
                "thinking",
                "answer",
                "done",
            ]
        );
        assert!(events.last().unwrap().is_terminal());
    }

    #[tokio::test]
    async fn test_stream_reports_failure() {
        // Script exhausts immediately after forcing a second completion
        let agent = agent_with_script(vec![
            "```tool\n{\"tool\": \"ping\", \"arguments\": {}}\n```",
        ]);

        let events: Vec<AgentEvent> = agent.stream("fail me").collect().await;
        let kinds: Vec<&str> = events.iter().map(|e| e.kind()).collect();

        assert!(kinds.contains(&"failed"));
        assert_eq!(*kinds.last().unwrap(), "done");
    }

    #[tokio::test]
    async fn test_run_truncates_oversized_history() {
        let agent = agent_with_script(vec!["short answer"]);

        let mut conversation = Conversation::with_system_prompt("sys");
        conversation.set_max_context_tokens(40);
        for i in 0..20 {
            conversation.push(Message::user(format!("old context line {i}")));
        }

        let answer = agent.run(&mut conversation).await.unwrap();

        assert_eq!(answer, "short answer");
        // 21 messages went in; the loop trims before each completion
        assert!(conversation.len() <= 6);
    }

    #[tokio::test]
    async fn test_dropped_stream_cancels_run() {
        let provider = Arc::new(GatedProvider {
            reply: "```tool\n{\"tool\": \"ping\", \"arguments\": {}}\n```".into(),
            calls: AtomicUsize::new(0),
            gate: tokio::sync::Notify::new(),
        });
        let mut tools = ToolRegistry::new();
        tools.register(PingTool);
        let agent = Agent::new(provider.clone(), Arc::new(tools), AgentConfig::default());

        let mut events = agent.stream("keep going");
        // run_started, thinking, tool_started, tool_finished, thinking
        for _ in 0..5 {
            events.next().await.unwrap();
        }
        drop(events);

        // Release the second completion; its next emit hits a closed channel
        provider.gate.notify_one();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_parse_fenced_tool_call() {
        let agent = agent_with_script(vec![]);
        let content = "Let me check.\n```tool\n{\"tool\": \"ping\", \"arguments\": {\"target\": \"btc\"}}\n```";
        let call = agent.parse_tool_call(content).unwrap();
        assert_eq!(call.name, "ping");
        assert!(call.id.is_some());
    }

    #[test]
    fn test_parse_inline_tool_call() {
        let agent = agent_with_script(vec![]);
        let content = r#"I'll use {"tool": "ping", "arguments": {}} now."#;
        let call = agent.parse_tool_call(content).unwrap();
        assert_eq!(call.name, "ping");
    }

    #[test]
    fn test_plain_text_is_not_a_tool_call() {
        let agent = agent_with_script(vec![]);
        assert!(agent.parse_tool_call("Just a normal answer.").is_none());
    }
}
