//! Log sinks: where the loop's execution log goes.
//!
//! [`BufferedSink`] collects entries for a synchronous result;
//! [`ChannelSink`] forwards each entry to a live stream as it is produced.

use async_trait::async_trait;
use taskclaw_core::log::{LogEntry, LogSink};
use tokio::sync::{Mutex, mpsc};
use tracing::debug;

use crate::stream_event::AgentStreamEvent;

/// Collects every entry in production order.
#[derive(Default)]
pub struct BufferedSink {
    entries: Mutex<Vec<LogEntry>>,
}

impl BufferedSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the collected entries, leaving the sink empty.
    pub async fn drain(&self) -> Vec<LogEntry> {
        std::mem::take(&mut *self.entries.lock().await)
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[async_trait]
impl LogSink for BufferedSink {
    async fn emit(&self, entry: LogEntry) {
        self.entries.lock().await.push(entry);
    }
}

/// Forwards entries as `log` stream events over a bounded channel.
///
/// `emit` waits for channel capacity, so a slow consumer slows the run
/// instead of losing entries. A closed channel (client gone) is not an
/// error: the run continues and the entry is dropped.
#[derive(Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<AgentStreamEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<AgentStreamEvent>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl LogSink for ChannelSink {
    async fn emit(&self, entry: LogEntry) {
        if self.tx.send(entry.into()).await.is_err() {
            debug!("Stream receiver dropped, discarding log entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskclaw_core::log::LogKind;

    #[tokio::test]
    async fn buffered_keeps_order() {
        let sink = BufferedSink::new();
        sink.emit(LogEntry::new(LogKind::Text, "one")).await;
        sink.emit(LogEntry::new(LogKind::Thought, "two")).await;
        sink.emit(LogEntry::new(LogKind::Completion, "three")).await;
        assert_eq!(sink.len().await, 3);

        let messages: Vec<String> = sink.drain().await.into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["one", "two", "three"]);
        assert_eq!(sink.len().await, 0);
    }

    #[tokio::test]
    async fn channel_forwards_as_log_events() {
        let (tx, mut rx) = mpsc::channel(4);
        let sink = ChannelSink::new(tx);
        sink.emit(LogEntry::new(LogKind::Action, "Action: calculator")).await;

        match rx.recv().await.unwrap() {
            AgentStreamEvent::Log { log_type, message, .. } => {
                assert_eq!(log_type, LogKind::Action);
                assert_eq!(message, "Action: calculator");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn channel_closed_is_ignored() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sink = ChannelSink::new(tx);
        sink.emit(LogEntry::new(LogKind::Text, "nobody listening")).await;
    }
}
