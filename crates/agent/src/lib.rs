//! The agent control loop: the heart of TaskClaw.
//!
//! Each run follows a **Thought → Tool → Observation** cycle driven by a
//! line protocol:
//!
//! 1. **Prompt** the model with the tool catalog, the task and the context so far
//! 2. **Parse** the reply: `FINAL:` ends the run, `THOUGHT:/TOOL:/INPUT:` continues it
//! 3. **Dispatch** the named tool against the caller's session
//! 4. **Append** the observation to the context and loop
//!
//! The loop stops on a final answer, an unparseable reply, a provider
//! failure, or after the configured number of steps. Every step is
//! reported to a [`LogSink`](taskclaw_core::LogSink) as it happens.

pub mod loop_runner;
pub mod prompt;
pub mod protocol;
pub mod reporter;
pub mod service;
pub mod session_store;
pub mod stream_event;

#[cfg(test)]
mod test_helpers;

pub use loop_runner::{AgentLoop, INCOMPLETE_SENTINEL, LoopOutcome, StopReason};
pub use protocol::{Action, Reply, parse_reply};
pub use reporter::{BufferedSink, ChannelSink};
pub use service::{DEFAULT_HISTORY_LIMIT, RunReport, TaskAgent};
pub use session_store::SessionStore;
pub use stream_event::AgentStreamEvent;
