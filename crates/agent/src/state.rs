//! Per-run conversational state and the updates nodes produce.
//!
//! `AgentState` is owned by one run. Nodes never mutate it directly; they
//! return a [`NodeUpdate`] that the driver applies, which is where the
//! tool-result correlation invariant is enforced.

use paperscout_core::error::RunFailed;
use paperscout_core::message::{Message, Role};
use serde::Serialize;

/// The record threaded through every node of a run.
#[derive(Debug, Clone, Serialize)]
pub struct AgentState {
    messages: Vec<Message>,
    requires_research: bool,
    is_good_answer: bool,
    num_feedback_requests: u32,
}

impl AgentState {
    /// Start a run from the human's question.
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user(input)],
            requires_research: false,
            is_good_answer: false,
            num_feedback_requests: 0,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn requires_research(&self) -> bool {
        self.requires_research
    }

    pub fn is_good_answer(&self) -> bool {
        self.is_good_answer
    }

    pub fn num_feedback_requests(&self) -> u32 {
        self.num_feedback_requests
    }

    /// Tool results at the end of the history that no AI message has
    /// followed up on yet.
    pub fn trailing_tool_results(&self) -> &[Message] {
        let start = self
            .messages
            .iter()
            .rposition(|m| m.role != Role::Tool)
            .map_or(0, |i| i + 1);
        &self.messages[start..]
    }

    /// Apply a node's update, returning the messages it appended.
    ///
    /// Every tool-result message must answer a pending request of the AI
    /// message it follows (possibly after sibling tool results). Violations
    /// fail the run and leave the state untouched.
    pub fn apply(&mut self, update: NodeUpdate) -> Result<&[Message], RunFailed> {
        let before = self.messages.len();

        for message in update.messages {
            if message.role == Role::Tool
                && let Err(violation) = self.check_tool_result(&message)
            {
                self.messages.truncate(before);
                return Err(violation);
            }
            self.messages.push(message);
        }

        if let Some(flag) = update.requires_research {
            self.requires_research = flag;
        }
        if let Some(flag) = update.is_good_answer {
            self.is_good_answer = flag;
        }
        if update.feedback_requested {
            self.num_feedback_requests += 1;
        }

        Ok(&self.messages[before..])
    }

    fn check_tool_result(&self, message: &Message) -> Result<(), RunFailed> {
        let Some(call_id) = message.tool_call_id.as_deref() else {
            return Err(RunFailed::ContractViolation(
                "tool result without a correlation id".into(),
            ));
        };

        let requester = self.messages.iter().rev().find(|m| m.role != Role::Tool);
        match requester {
            Some(ai) if ai.role == Role::Assistant && ai.tool_calls.iter().any(|c| c.id == call_id) => {
                Ok(())
            }
            _ => Err(RunFailed::ContractViolation(format!(
                "tool result '{call_id}' does not answer a pending request of the preceding AI message"
            ))),
        }
    }
}

/// A tool invocation performed while producing an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRun {
    pub call_id: String,
    pub tool_name: String,
    pub success: bool,
    pub duration_ms: u64,
}

/// What a node wants changed in the state.
#[derive(Debug, Clone, Default)]
pub struct NodeUpdate {
    pub messages: Vec<Message>,
    pub requires_research: Option<bool>,
    pub is_good_answer: Option<bool>,
    pub feedback_requested: bool,
    pub tool_runs: Vec<ToolRun>,
}

impl NodeUpdate {
    pub fn message(message: Message) -> Self {
        Self {
            messages: vec![message],
            ..Self::default()
        }
    }

    /// Append `message` when there is one.
    pub fn with_optional_message(mut self, message: Option<Message>) -> Self {
        self.messages.extend(message);
        self
    }
}
