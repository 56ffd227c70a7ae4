//! Events streamed to a client while a task runs.
//!
//! A stream is one `start`, zero or more `log` events in production
//! order, then exactly one `complete` or `error`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskclaw_core::log::{LogEntry, LogKind};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentStreamEvent {
    /// The run has been accepted.
    Start {
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// One execution log entry.
    Log {
        #[serde(rename = "logType")]
        log_type: LogKind,
        message: String,
        data: Option<serde_json::Value>,
        timestamp: DateTime<Utc>,
    },

    /// The run finished with a response.
    Complete {
        response: String,
        timestamp: DateTime<Utc>,
    },

    /// The run failed before producing a response.
    Error {
        error: String,
        timestamp: DateTime<Utc>,
    },
}

impl AgentStreamEvent {
    pub fn start() -> Self {
        Self::Start {
            message: "Agent execution started".into(),
            timestamp: Utc::now(),
        }
    }

    pub fn complete(response: impl Into<String>) -> Self {
        Self::Complete {
            response: response.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self::Error {
            error: error.into(),
            timestamp: Utc::now(),
        }
    }

    /// SSE event name for this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Start { .. } => "start",
            Self::Log { .. } => "log",
            Self::Complete { .. } => "complete",
            Self::Error { .. } => "error",
        }
    }

    /// Whether this event ends the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. } | Self::Error { .. })
    }
}

impl From<LogEntry> for AgentStreamEvent {
    fn from(entry: LogEntry) -> Self {
        Self::Log {
            log_type: entry.kind,
            message: entry.message,
            data: entry.data,
            timestamp: entry.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_event_wire_shape() {
        let entry = LogEntry::new(LogKind::Thought, "Thought: add them");
        let json = serde_json::to_value(AgentStreamEvent::from(entry)).unwrap();
        assert_eq!(json["type"], "log");
        assert_eq!(json["logType"], "thought");
        assert_eq!(json["message"], "Thought: add them");
        assert!(json["data"].is_null());
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn terminal_events() {
        let complete = serde_json::to_value(AgentStreamEvent::complete("42")).unwrap();
        assert_eq!(complete["type"], "complete");
        assert_eq!(complete["response"], "42");

        let error = serde_json::to_value(AgentStreamEvent::error("boom")).unwrap();
        assert_eq!(error["type"], "error");
        assert_eq!(error["error"], "boom");

        assert!(AgentStreamEvent::complete("x").is_terminal());
        assert!(!AgentStreamEvent::start().is_terminal());
    }

    #[test]
    fn event_type_matches_tag() {
        for event in [
            AgentStreamEvent::start(),
            AgentStreamEvent::from(LogEntry::new(LogKind::Text, "Step 1")),
            AgentStreamEvent::complete("done"),
            AgentStreamEvent::error("failed"),
        ] {
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["type"], event.event_type());
        }
    }
}
