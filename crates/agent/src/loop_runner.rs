//! The agent control loop.
//!
//! Each iteration prompts the model, parses its reply and either finishes,
//! runs one tool, or records a thought. The accumulated context string is
//! fed back into the next prompt. The loop never raises: provider and
//! format failures end the run with whatever context exists.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use taskclaw_core::log::{LogEntry, LogKind, LogSink};
use taskclaw_core::provider::{Provider, ProviderRequest};
use taskclaw_core::session::Session;
use taskclaw_core::tool::ToolRegistry;
use tracing::{debug, info, warn};

use crate::prompt;
use crate::protocol::{self, Action, Reply};

/// Returned when a run ends without an answer and without any context.
pub const INCOMPLETE_SENTINEL: &str = "The task did not complete.";

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    FinalAnswer,
    StepLimit,
    FormatError,
    ProviderError,
}

/// The result of one run.
#[derive(Debug, Clone)]
pub struct LoopOutcome {
    pub response: String,
    pub steps: usize,
    pub stop: StopReason,
}

/// The control loop that alternates model calls and tool execution.
pub struct AgentLoop {
    /// The LLM provider to use
    provider: Arc<dyn Provider>,

    /// Tools the model may call, in catalog order
    tools: Arc<ToolRegistry>,

    /// The model to use
    model: String,

    /// Temperature setting
    temperature: f32,

    /// Max tokens per response; provider default when unset
    max_tokens: Option<u32>,

    /// Maximum model calls per run
    max_steps: usize,

    /// Language the model is told to answer in
    language: String,
}

impl AgentLoop {
    pub fn new(provider: Arc<dyn Provider>, tools: Arc<ToolRegistry>, model: impl Into<String>) -> Self {
        Self {
            provider,
            tools,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            max_steps: 10,
            language: "Japanese".into(),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Set the iteration cap.
    pub fn with_max_steps(mut self, max: usize) -> Self {
        self.max_steps = max;
        self
    }

    /// Set the language the model is told to answer in.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Run a task to completion against `session`, reporting every log
    /// entry to `sink` as it is produced.
    pub async fn run(&self, task: &str, session: &Session, sink: &dyn LogSink) -> LoopOutcome {
        info!(session = session.id(), task, "Agent run started");
        emit(sink, LogEntry::new(LogKind::Text, format!("Agent started: {task}"))).await;

        let system = prompt::system_instruction(&self.language);
        let catalog = self.tools.catalog();
        let names = self.tools.names();
        let mut context = String::new();
        let mut step = 0;

        let stop = loop {
            if step >= self.max_steps {
                warn!(session = session.id(), max_steps = self.max_steps, "Step limit reached");
                break StopReason::StepLimit;
            }
            step += 1;
            emit(sink, LogEntry::new(LogKind::Text, format!("Step {step}"))).await;

            let request = ProviderRequest::new(
                &self.model,
                &system,
                prompt::step_prompt(&catalog, &names, task, &context, &self.language),
            )
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);

            let response = match self.provider.complete(request).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(session = session.id(), step, error = %e, "Provider call failed");
                    emit(sink, LogEntry::new(LogKind::Text, format!("LLM error: {e}"))).await;
                    break StopReason::ProviderError;
                }
            };

            let content = response.text();
            debug!(step, reply = content, "Model reply");

            let (thought, action) = match protocol::parse_reply(content) {
                Reply::Final(answer) => {
                    emit(sink, LogEntry::new(LogKind::Completion, format!("Done: {answer}"))).await;
                    info!(session = session.id(), steps = step, "Agent run finished");
                    return LoopOutcome {
                        response: answer,
                        steps: step,
                        stop: StopReason::FinalAnswer,
                    };
                }
                Reply::Step { thought, action } => (thought, action),
                Reply::Unparseable { thought } => {
                    if let Some(thought) = thought {
                        self.record_thought(sink, &mut context, &thought).await;
                    }
                    emit(
                        sink,
                        LogEntry::new(
                            LogKind::Text,
                            format!("Format error: expected THOUGHT/TOOL/INPUT or FINAL. Received: {content}"),
                        ),
                    )
                    .await;
                    break StopReason::FormatError;
                }
            };

            if let Some(thought) = thought {
                self.record_thought(sink, &mut context, &thought).await;
            }

            if let Some(action) = action {
                self.dispatch(sink, session, &mut context, action).await;
            }
        };

        let trimmed = context.trim();
        let response = if trimmed.is_empty() {
            INCOMPLETE_SENTINEL.to_string()
        } else {
            trimmed.to_string()
        };

        LoopOutcome {
            response,
            steps: step,
            stop,
        }
    }

    async fn record_thought(&self, sink: &dyn LogSink, context: &mut String, thought: &str) {
        emit(sink, LogEntry::new(LogKind::Thought, format!("Thought: {thought}"))).await;
        context.push_str(&format!(" Thought: {thought}"));
    }

    async fn dispatch(&self, sink: &dyn LogSink, session: &Session, context: &mut String, action: Action) {
        let Action { tool, input } = action;
        emit(
            sink,
            LogEntry::new(LogKind::Action, format!("Action: {tool} (input: {input})"))
                .with_data(serde_json::json!({ "tool": tool, "input": input })),
        )
        .await;

        match self.tools.invoke(&tool, &input, session).await {
            Some(result) => {
                emit(
                    sink,
                    LogEntry::new(LogKind::Tool, format!("Tool result: {}", result.output))
                        .with_data(serde_json::json!({ "tool": tool, "success": result.success })),
                )
                .await;
                context.push_str(&format!(
                    " Used {tool} with input \"{input}\" and got result: {}",
                    result.output
                ));
            }
            None => {
                warn!(tool = %tool, "Model asked for an unknown tool");
                emit(sink, LogEntry::new(LogKind::Tool, format!("Unknown tool: {tool}"))).await;
                context.push_str(&format!(" Unknown tool: {tool}"));
            }
        }
    }
}

/// Mirror an entry to tracing, then hand it to the sink.
async fn emit(sink: &dyn LogSink, entry: LogEntry) {
    info!(kind = entry.kind.as_str(), "{} {}", entry.kind.marker(), entry.message);
    sink.emit(entry).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::BufferedSink;
    use crate::test_helpers::{FailingProvider, SequentialMockProvider};
    use taskclaw_core::task::TaskStatus;
    use taskclaw_tools::{PlannerSettings, default_registry};

    fn agent(provider: Arc<dyn Provider>) -> AgentLoop {
        let tools = Arc::new(default_registry(provider.clone(), PlannerSettings::default()));
        AgentLoop::new(provider, tools, "mock-model")
    }

    fn kinds(entries: &[LogEntry]) -> Vec<LogKind> {
        entries.iter().map(|e| e.kind).collect()
    }

    #[tokio::test]
    async fn final_first_short_circuits() {
        let provider = Arc::new(SequentialMockProvider::from_texts(&["FINAL: 42"]));
        let sink = BufferedSink::new();
        let outcome = agent(provider.clone()).run("what is 6*7", &Session::default(), &sink).await;

        assert_eq!(outcome.response, "42");
        assert_eq!(outcome.stop, StopReason::FinalAnswer);
        assert_eq!(outcome.steps, 1);
        assert_eq!(provider.call_count(), 1);

        let entries = sink.drain().await;
        assert_eq!(kinds(&entries), vec![LogKind::Text, LogKind::Text, LogKind::Completion]);
        assert_eq!(entries[0].message, "Agent started: what is 6*7");
        assert_eq!(entries[1].message, "Step 1");
        assert!(entries[2].message.contains("42"));
        assert!(!entries.iter().any(|e| e.kind == LogKind::Action));
    }

    #[tokio::test]
    async fn tool_then_final() {
        let provider = Arc::new(SequentialMockProvider::from_texts(&[
            "THOUGHT: I should calculate\nTOOL: calculator\nINPUT: 10 + 5 * 2",
            "FINAL: The answer is 20",
        ]));
        let sink = BufferedSink::new();
        let outcome = agent(provider.clone()).run("compute 10 + 5 * 2", &Session::default(), &sink).await;

        assert_eq!(outcome.response, "The answer is 20");
        assert_eq!(outcome.steps, 2);

        let entries = sink.drain().await;
        assert_eq!(
            kinds(&entries),
            vec![
                LogKind::Text,
                LogKind::Text,
                LogKind::Thought,
                LogKind::Action,
                LogKind::Tool,
                LogKind::Text,
                LogKind::Completion,
            ]
        );
        assert_eq!(entries[4].message, "Tool result: Calculation result: 10 + 5 * 2 = 20");
        assert_eq!(entries[3].data.as_ref().unwrap()["tool"], "calculator");

        let second_prompt = &provider.requests()[1].messages[1].content;
        assert!(second_prompt.contains(
            "Previous context:  Thought: I should calculate Used calculator with input \"10 + 5 * 2\" and got result: Calculation result: 10 + 5 * 2 = 20"
        ));
    }

    #[tokio::test]
    async fn never_final_stops_at_cap() {
        let replies = vec!["THOUGHT: keep going"; 12];
        let provider = Arc::new(SequentialMockProvider::from_texts(&replies));
        let sink = BufferedSink::new();
        let outcome = agent(provider.clone()).run("loop forever", &Session::default(), &sink).await;

        assert_eq!(provider.call_count(), 10);
        assert_eq!(outcome.steps, 10);
        assert_eq!(outcome.stop, StopReason::StepLimit);
        assert!(!outcome.response.is_empty());
        assert!(outcome.response.starts_with("Thought: keep going"));
    }

    #[tokio::test]
    async fn custom_step_cap() {
        let replies = vec!["THOUGHT: again"; 5];
        let provider = Arc::new(SequentialMockProvider::from_texts(&replies));
        let sink = BufferedSink::new();
        let outcome = agent(provider.clone())
            .with_max_steps(3)
            .run("t", &Session::default(), &sink)
            .await;
        assert_eq!(provider.call_count(), 3);
        assert_eq!(outcome.steps, 3);
    }

    #[tokio::test]
    async fn unknown_tool_continues() {
        let provider = Arc::new(SequentialMockProvider::from_texts(&[
            "THOUGHT: try it\nTOOL: weather\nINPUT: Tokyo",
            "FINAL: no weather tool",
        ]));
        let sink = BufferedSink::new();
        let outcome = agent(provider.clone()).run("weather?", &Session::default(), &sink).await;

        assert_eq!(outcome.response, "no weather tool");
        let entries = sink.drain().await;
        assert!(entries.iter().any(|e| e.kind == LogKind::Tool && e.message == "Unknown tool: weather"));
        assert!(provider.requests()[1].messages[1].content.contains(" Unknown tool: weather"));
    }

    #[tokio::test]
    async fn format_error_returns_context() {
        let provider = Arc::new(SequentialMockProvider::from_texts(&[
            "THOUGHT: first",
            "I think the answer is probably 5",
        ]));
        let sink = BufferedSink::new();
        let outcome = agent(provider.clone()).run("t", &Session::default(), &sink).await;

        assert_eq!(outcome.stop, StopReason::FormatError);
        assert_eq!(outcome.response, "Thought: first");
        assert_eq!(provider.call_count(), 2);

        let last = sink.drain().await.pop().unwrap();
        assert_eq!(last.kind, LogKind::Text);
        assert!(last.message.starts_with("Format error:"));
        assert!(last.message.contains("I think the answer is probably 5"));
    }

    #[tokio::test]
    async fn format_error_without_context_returns_sentinel() {
        let provider = Arc::new(SequentialMockProvider::from_texts(&["hello there"]));
        let sink = BufferedSink::new();
        let outcome = agent(provider).run("t", &Session::default(), &sink).await;
        assert_eq!(outcome.response, INCOMPLETE_SENTINEL);
    }

    #[tokio::test]
    async fn provider_error_stops_run() {
        let provider: Arc<dyn Provider> = Arc::new(FailingProvider);
        let sink = BufferedSink::new();
        let outcome = agent(provider).run("t", &Session::default(), &sink).await;

        assert_eq!(outcome.stop, StopReason::ProviderError);
        assert_eq!(outcome.response, INCOMPLETE_SENTINEL);
        let last = sink.drain().await.pop().unwrap();
        assert!(last.message.starts_with("LLM error:"));
    }

    #[tokio::test]
    async fn planner_and_todo_manager_share_session() {
        let provider = Arc::new(SequentialMockProvider::from_texts(&[
            "THOUGHT: plan first\nTOOL: task_planner\nINPUT: greet and count",
            "1. Write a greeting\n2. Count its words",
            "TOOL: todo_manager\nINPUT: complete 1",
            "TOOL: todo_manager\nINPUT: current",
            "FINAL: done",
        ]));
        let session = Session::new("s-plan");
        let sink = BufferedSink::new();
        let outcome = agent(provider.clone()).run("greet and count", &session, &sink).await;

        assert_eq!(outcome.response, "done");
        assert_eq!(provider.call_count(), 5);

        let tasks = session.task_snapshot().await;
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks.records()[0].status, TaskStatus::Completed);
        assert_eq!(tasks.records()[1].status, TaskStatus::Pending);

        let entries = sink.drain().await;
        assert!(entries.iter().any(|e| e.message == "Tool result: Current task: Count its words"));
    }

    #[tokio::test]
    async fn request_uses_configured_settings() {
        let provider = Arc::new(SequentialMockProvider::from_texts(&["FINAL: ok"]));
        let sink = BufferedSink::new();
        agent(provider.clone())
            .with_temperature(0.2)
            .with_max_tokens(512)
            .with_language("English")
            .run("t", &Session::default(), &sink)
            .await;

        let request = &provider.requests()[0];
        assert_eq!(request.model, "mock-model");
        assert_eq!(request.max_tokens, Some(512));
        assert!((request.temperature - 0.2).abs() < f32::EPSILON);
        assert!(request.messages[0].content.contains("English"));
    }
}
