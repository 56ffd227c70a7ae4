//! # TaskClaw Core
//!
//! Domain types, traits, and error definitions for the TaskClaw agent.
//! It carries no HTTP or provider dependencies; it defines the domain model
//! that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every seam is defined as a trait here. Implementations live in their
//! respective crates:
//! - `Provider`: implemented by `taskclaw-providers` (and scripted mocks in tests)
//! - `Tool`: implemented by `taskclaw-tools`
//! - `LogSink`: implemented by `taskclaw-agent` reporters

pub mod error;
pub mod history;
pub mod log;
pub mod message;
pub mod provider;
pub mod session;
pub mod task;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{ProviderError, ToolError};
pub use history::{HistoryEntry, HistoryRole};
pub use log::{LogEntry, LogKind, LogSink};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse};
pub use session::{DEFAULT_SESSION_ID, Session};
pub use task::{TaskList, TaskPriority, TaskRecord, TaskStatus};
pub use tool::{Tool, ToolDefinition, ToolRegistry, ToolResult};
