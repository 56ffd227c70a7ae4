//! Execution log entries and the sink they are reported to.
//!
//! The agent loop produces entries in strict order and hands each one to a
//! `LogSink` the moment it is produced. Sinks decide whether to buffer the
//! entries for a synchronous result or forward them to a live connection.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a log entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    /// Progress and error notices
    Text,
    /// The model's reasoning line
    Thought,
    /// A tool the model asked to run
    Action,
    /// A tool result (or an unknown-tool notice)
    Tool,
    /// The final answer
    Completion,
}

impl LogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Thought => "thought",
            Self::Action => "action",
            Self::Tool => "tool",
            Self::Completion => "completion",
        }
    }

    /// Console marker used when mirroring entries to tracing output.
    pub fn marker(&self) -> &'static str {
        match self {
            Self::Thought => "💭",
            Self::Action => "🎯",
            Self::Tool => "🔧",
            Self::Text | Self::Completion => "📝",
        }
    }
}

/// One unit of observable progress during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(rename = "type")]
    pub kind: LogKind,
    pub message: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    pub fn new(kind: LogKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            data: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Receives log entries in production order.
///
/// `emit` is awaited by the loop before it moves on, so an implementation
/// that forwards to a connection has delivered (or enqueued) the entry
/// before the next step starts.
#[async_trait]
pub trait LogSink: Send + Sync {
    async fn emit(&self, entry: LogEntry);
}
