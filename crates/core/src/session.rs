//! Per-session state threaded through the agent loop and its tools.
//!
//! A session owns the TODO list the planner writes and the manager edits,
//! plus the conversation history recorded after each run. Nothing here is
//! global: callers obtain a `Session` from a store keyed by session id.

use tokio::sync::RwLock;

use crate::history::HistoryEntry;
use crate::task::TaskList;

/// Session id used when a request does not name one.
pub const DEFAULT_SESSION_ID: &str = "default";

#[derive(Debug)]
pub struct Session {
    id: String,
    tasks: RwLock<TaskList>,
    history: RwLock<Vec<HistoryEntry>>,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tasks: RwLock::new(TaskList::new()),
            history: RwLock::new(Vec::new()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The session's task list. Tools lock it for the duration of one call.
    pub fn tasks(&self) -> &RwLock<TaskList> {
        &self.tasks
    }

    /// Replace the task list wholesale with a new generation.
    pub async fn replace_tasks(&self, list: TaskList) {
        *self.tasks.write().await = list;
    }

    pub async fn task_snapshot(&self) -> TaskList {
        self.tasks.read().await.clone()
    }

    /// Append the human task and the ai response as one pair.
    pub async fn record_exchange(&self, task: &str, response: &str) {
        let mut history = self.history.write().await;
        history.push(HistoryEntry::human(task));
        history.push(HistoryEntry::ai(response));
    }

    /// The most recent `limit` entries, oldest first.
    pub async fn history(&self, limit: usize) -> Vec<HistoryEntry> {
        let history = self.history.read().await;
        let start = history.len().saturating_sub(limit);
        history[start..].to_vec()
    }

    pub async fn clear_history(&self) {
        self.history.write().await.clear();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_ID)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HistoryRole;

    #[tokio::test]
    async fn exchange_appends_human_then_ai() {
        let session = Session::new("s1");
        session.record_exchange("add 2 and 3", "5").await;

        let history = session.history(20).await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, HistoryRole::Human);
        assert_eq!(history[0].content, "add 2 and 3");
        assert_eq!(history[1].role, HistoryRole::Ai);
        assert_eq!(history[1].content, "5");
    }

    #[tokio::test]
    async fn history_returns_tail_newest_last() {
        let session = Session::default();
        for i in 0..5 {
            session.record_exchange(&format!("task {i}"), &format!("answer {i}")).await;
        }
        let tail = session.history(3).await;
        assert_eq!(tail.len(), 3);
        assert_eq!(tail[0].content, "answer 3");
        assert_eq!(tail[2].content, "answer 4");

        assert_eq!(session.history(100).await.len(), 10);
        assert!(session.history(0).await.is_empty());
    }

    #[tokio::test]
    async fn clear_then_read_is_empty() {
        let session = Session::default();
        session.record_exchange("hello", "world").await;
        session.clear_history().await;
        assert!(session.history(20).await.is_empty());
        assert!(session.history(1).await.is_empty());
    }

    #[tokio::test]
    async fn replace_tasks_swaps_whole_list() {
        let session = Session::default();
        session.replace_tasks(TaskList::from_titles(["a", "b"])).await;
        assert_eq!(session.task_snapshot().await.len(), 2);

        session.replace_tasks(TaskList::from_titles(["c"])).await;
        let snapshot = session.task_snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.records()[0].title, "c");
    }
}
