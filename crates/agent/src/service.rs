//! `TaskAgent`: the agent loop plus session state, as used by the gateway
//! and the CLI.

use std::sync::Arc;

use serde::Serialize;
use taskclaw_config::AppConfig;
use taskclaw_core::history::HistoryEntry;
use taskclaw_core::log::{LogEntry, LogSink};
use taskclaw_core::provider::Provider;
use taskclaw_core::tool::ToolRegistry;
use taskclaw_tools::{PlannerSettings, default_registry};
use tracing::info;

use crate::loop_runner::{AgentLoop, LoopOutcome, StopReason};
use crate::reporter::BufferedSink;
use crate::session_store::SessionStore;

/// Default number of history entries returned by [`TaskAgent::history`].
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// The buffered result of one run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub success: bool,
    pub response: String,
    pub steps: usize,
    pub stop_reason: StopReason,
    pub execution_logs: Vec<LogEntry>,
    pub session_id: String,
}

pub struct TaskAgent {
    agent: AgentLoop,
    sessions: SessionStore,
}

impl TaskAgent {
    pub fn new(agent: AgentLoop, sessions: SessionStore) -> Self {
        Self { agent, sessions }
    }

    /// Wire up the loop, the built-in tools and the session store from
    /// configuration. The task planner shares `provider` with the loop.
    pub fn from_config(config: &AppConfig, provider: Arc<dyn Provider>) -> Self {
        let planner = PlannerSettings {
            model: config.default_model.clone(),
            temperature: config.agent.planner_temperature,
            max_tokens: Some(config.default_max_tokens),
            language: config.agent.response_language.clone(),
        };
        let tools = Arc::new(default_registry(provider.clone(), planner));

        let agent = AgentLoop::new(provider, tools, &config.default_model)
            .with_temperature(config.default_temperature)
            .with_max_tokens(config.default_max_tokens)
            .with_max_steps(config.agent.max_steps)
            .with_language(&config.agent.response_language);

        Self::new(agent, SessionStore::from_config(&config.sessions))
    }

    pub fn tools(&self) -> &ToolRegistry {
        self.agent.tools()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Run a task and return the collected log with the response.
    pub async fn execute_task(&self, task: &str, session_id: Option<&str>) -> RunReport {
        let sink = BufferedSink::new();
        let (session_id, outcome) = self.run(task, session_id, &sink).await;

        RunReport {
            success: true,
            response: outcome.response,
            steps: outcome.steps,
            stop_reason: outcome.stop,
            execution_logs: sink.drain().await,
            session_id,
        }
    }

    /// Run a task, reporting each log entry to `sink` as it happens.
    pub async fn execute_task_streaming(
        &self,
        task: &str,
        session_id: Option<&str>,
        sink: &dyn LogSink,
    ) -> String {
        self.run(task, session_id, sink).await.1.response
    }

    async fn run(&self, task: &str, session_id: Option<&str>, sink: &dyn LogSink) -> (String, LoopOutcome) {
        let session = self.sessions.get_or_create(session_id);
        info!(session = session.id(), "Starting agent task");

        let outcome = self.agent.run(task, &session, sink).await;
        session.record_exchange(task, &outcome.response).await;

        info!(
            session = session.id(),
            steps = outcome.steps,
            stop = ?outcome.stop,
            "Agent task finished"
        );
        (session.id().to_string(), outcome)
    }

    /// The most recent history entries for a session, oldest first.
    pub async fn history(&self, session_id: Option<&str>, limit: Option<usize>) -> Vec<HistoryEntry> {
        match self.sessions.get(session_id) {
            Some(session) => session.history(limit.unwrap_or(DEFAULT_HISTORY_LIMIT)).await,
            None => Vec::new(),
        }
    }

    /// Clear one session's history, or every session's when no id is given.
    pub async fn clear_history(&self, session_id: Option<&str>) {
        let targets: Vec<_> = match session_id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => self.sessions.get(Some(id)).into_iter().collect(),
            None => self.sessions.all(),
        };
        for session in &targets {
            session.clear_history().await;
        }
        info!(sessions = targets.len(), "History cleared");
    }
}
