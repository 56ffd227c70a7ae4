//! Task records: the TODO list produced by the planner tool.
//!
//! A list is generated wholesale from the planner's numbered lines and then
//! only ever has individual records flipped from pending to completed.
//! Records are never removed; a new plan replaces the whole list.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Completed,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::Completed => f.write_str("completed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    High,
    Medium,
    Low,
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => f.write_str("high"),
            Self::Medium => f.write_str("medium"),
            Self::Low => f.write_str("low"),
        }
    }
}

/// A single TODO item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// `subtask_<generation millis>_<ordinal>`
    pub id: String,
    pub title: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
}

/// An ordered list of task records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskList {
    records: Vec<TaskRecord>,
}

impl TaskList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a fresh generation from sub-task titles.
    ///
    /// The first record is `high` priority, every later one `medium`.
    pub fn from_titles<I, S>(titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let generation = Utc::now().timestamp_millis();
        let records = titles
            .into_iter()
            .enumerate()
            .map(|(index, title)| TaskRecord {
                id: format!("subtask_{generation}_{index}"),
                title: title.into(),
                status: TaskStatus::Pending,
                priority: if index == 0 {
                    TaskPriority::High
                } else {
                    TaskPriority::Medium
                },
            })
            .collect();
        Self { records }
    }

    pub fn records(&self) -> &[TaskRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Mark the record at a 1-based `position` completed.
    ///
    /// Returns `None` (and changes nothing) when the position is out of range.
    pub fn complete(&mut self, position: usize) -> Option<&TaskRecord> {
        let index = position.checked_sub(1)?;
        let record = self.records.get_mut(index)?;
        record.status = TaskStatus::Completed;
        Some(record)
    }

    /// The first record still pending, in list order.
    pub fn current(&self) -> Option<&TaskRecord> {
        self.records
            .iter()
            .find(|r| r.status == TaskStatus::Pending)
    }
}
