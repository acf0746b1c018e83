//! Collects a run's event stream into its final message.

use paperscout_core::error::RunFailed;
use paperscout_core::message::Message;
use tokio::sync::mpsc;

use crate::stream_event::AgentStreamEvent;

/// Accumulates every message a run appends, in order.
#[derive(Debug, Default)]
pub struct StreamCollector {
    messages: Vec<Message>,
}

impl StreamCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every message seen so far.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Feed one event. Returns the outcome once the run has ended:
    /// the last appended message, or `None` if nothing was ever appended.
    pub fn push(&mut self, event: AgentStreamEvent) -> Option<Result<Option<Message>, RunFailed>> {
        match event {
            AgentStreamEvent::Message { message, .. } => {
                self.messages.push(message);
                None
            }
            AgentStreamEvent::Done { .. } => Some(Ok(self.messages.last().cloned())),
            AgentStreamEvent::Error { message, failure } => {
                Some(Err(failure.unwrap_or(RunFailed::Interrupted(message))))
            }
            _ => None,
        }
    }

    /// Drain `events` and return the last appended message.
    pub async fn collect(
        events: mpsc::Receiver<AgentStreamEvent>,
    ) -> Result<Option<Message>, RunFailed> {
        Self::collect_with(events, |_| {}).await
    }

    /// Like [`collect`](Self::collect), showing every event to `inspect` first.
    pub async fn collect_with(
        mut events: mpsc::Receiver<AgentStreamEvent>,
        mut inspect: impl FnMut(&AgentStreamEvent),
    ) -> Result<Option<Message>, RunFailed> {
        let mut collector = Self::new();
        while let Some(event) = events.recv().await {
            inspect(&event);
            if let Some(outcome) = collector.push(event) {
                return outcome;
            }
        }
        Err(RunFailed::Interrupted(
            "event stream closed before the run finished".into(),
        ))
    }
}
