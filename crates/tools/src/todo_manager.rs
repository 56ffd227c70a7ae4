//! TODO manager tool: reads and updates the session's task list.
//!
//! Input is a command word followed by optional arguments:
//! `list`, `complete <n>` (1-based) or `current`. The command word is
//! case-insensitive.

use async_trait::async_trait;
use taskclaw_core::error::ToolError;
use taskclaw_core::session::Session;
use taskclaw_core::tool::{Tool, ToolResult};

pub struct TodoManagerTool;

/// A parsed todo_manager command.
#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    List,
    Complete(Option<&'a str>),
    Current,
    Unknown(&'a str),
}

fn parse(input: &str) -> Command<'_> {
    let mut parts = input.split_whitespace();
    let action = parts.next().unwrap_or("");
    match action.to_lowercase().as_str() {
        "list" => Command::List,
        "complete" => Command::Complete(parts.next()),
        "current" => Command::Current,
        _ => Command::Unknown(action),
    }
}

/// The leading run of ASCII digits as a task number, so `1.` or `2)` count.
fn task_number(arg: &str) -> Option<usize> {
    let end = arg
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(arg.len());
    arg[..end].parse().ok()
}

#[async_trait]
impl Tool for TodoManagerTool {
    fn name(&self) -> &str {
        "todo_manager"
    }

    fn description(&self) -> &str {
        "Manages the TODO list. Give an action (list, complete, current) and, for complete, the task number"
    }

    async fn execute(&self, input: &str, session: &Session) -> Result<ToolResult, ToolError> {
        let result = match parse(input) {
            Command::List => {
                let tasks = session.tasks().read().await;
                if tasks.is_empty() {
                    ToolResult::ok("TODO list is empty")
                } else {
                    let lines: Vec<String> = tasks
                        .records()
                        .iter()
                        .enumerate()
                        .map(|(i, r)| format!("{}. {} [{}]", i + 1, r.title, r.status))
                        .collect();
                    ToolResult::ok(format!("Current TODO list:\n{}", lines.join("\n")))
                }
            }
            Command::Complete(arg) => {
                let mut tasks = session.tasks().write().await;
                let completed = arg
                    .and_then(task_number)
                    .and_then(|n| tasks.complete(n).map(|r| (n, r.title.clone())));
                match completed {
                    Some((n, title)) => {
                        tracing::debug!(session = session.id(), task = n, "Task completed");
                        ToolResult::ok(format!("Marked task {n} \"{title}\" as completed"))
                    }
                    None => ToolResult::failed(format!(
                        "Invalid task number: {}",
                        arg.unwrap_or_default()
                    )),
                }
            }
            Command::Current => match session.tasks().read().await.current() {
                Some(record) => ToolResult::ok(format!("Current task: {}", record.title)),
                None => ToolResult::ok("There are no incomplete tasks"),
            },
            Command::Unknown(action) => ToolResult::failed(format!(
                "Unknown action: {action}. Available actions: list, complete, current"
            )),
        };
        Ok(result)
    }
}
