//! Task planner tool: asks the model to break a goal into sub-tasks and
//! replaces the session's TODO list with the result.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use taskclaw_core::error::ToolError;
use taskclaw_core::provider::{Provider, ProviderRequest};
use taskclaw_core::session::Session;
use taskclaw_core::task::TaskList;
use taskclaw_core::tool::{Tool, ToolResult};

/// Settings for the planner's model call.
#[derive(Debug, Clone)]
pub struct PlannerSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub language: String,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            model: "claude-3-5-sonnet-20241022".into(),
            temperature: 0.7,
            max_tokens: None,
            language: "Japanese".into(),
        }
    }
}

pub struct TaskPlannerTool {
    provider: Arc<dyn Provider>,
    settings: PlannerSettings,
}

impl TaskPlannerTool {
    pub fn new(provider: Arc<dyn Provider>, settings: PlannerSettings) -> Self {
        Self { provider, settings }
    }

    fn system_prompt(&self) -> String {
        format!(
            "You are an expert at breaking tasks down into efficient sub-tasks. Always respond in {}.",
            self.settings.language
        )
    }

    fn user_prompt(goal: &str) -> String {
        format!(
            "Break the following task into 3-5 concrete sub-tasks. Output each sub-task in this format:\n\n\
             Task: {goal}\n\n\
             Output format:\n\
             1. [description of sub-task 1]\n\
             2. [description of sub-task 2]\n\
             3. [description of sub-task 3]\n\
             ...\n\n\
             Requirements:\n\
             - Each sub-task is concrete and actionable\n\
             - Take the available tools (calculator, text_analyzer, message_creator) into account\n\
             - List the sub-tasks in a logical order"
        )
    }
}

static NUMBERED_LINE: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^\d+\.\s*(.*)$"));

/// Keep the lines that start with `<digits>.` and strip that prefix.
pub fn extract_subtasks(plan: &str) -> Result<Vec<String>, ToolError> {
    let numbered = NUMBERED_LINE
        .as_ref()
        .map_err(|e| ToolError::ExecutionFailed {
            tool_name: "task_planner".into(),
            reason: format!("Regex error: {e}"),
        })?;

    Ok(plan
        .lines()
        .map(str::trim)
        .filter_map(|line| numbered.captures(line))
        .map(|caps| caps.get(1).map(|m| m.as_str().trim()).unwrap_or("").to_string())
        .collect())
}

#[async_trait]
impl Tool for TaskPlannerTool {
    fn name(&self) -> &str {
        "task_planner"
    }

    fn description(&self) -> &str {
        "Breaks a task into smaller sub-tasks and creates a TODO list. Input is the main task to break down"
    }

    async fn execute(&self, input: &str, session: &Session) -> Result<ToolResult, ToolError> {
        let request = ProviderRequest::new(
            &self.settings.model,
            self.system_prompt(),
            Self::user_prompt(input.trim()),
        )
        .with_temperature(self.settings.temperature)
        .with_max_tokens(self.settings.max_tokens);

        let response = match self.provider.complete(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "Task planning call failed");
                return Ok(ToolResult::failed(format!("Task planning error: {e}")));
            }
        };

        let subtasks = extract_subtasks(response.text())?;
        let list = TaskList::from_titles(subtasks);
        tracing::info!(session = session.id(), count = list.len(), "TODO list generated");

        let output = if list.is_empty() {
            "TODO list created: no numbered sub-tasks were returned".to_string()
        } else {
            let lines: Vec<String> = list
                .records()
                .iter()
                .enumerate()
                .map(|(i, r)| format!("{}. {} ({})", i + 1, r.title, r.status))
                .collect();
            format!("TODO list created:\n{}", lines.join("\n"))
        };

        session.replace_tasks(list).await;
        Ok(ToolResult::ok(output))
    }
}
