//! Agent-level streaming events.
//!
//! `AgentStreamEvent`s are emitted by `ResearchAgent::run_stream` as the
//! control loop progresses, so a host can render each node's output live.
//!
//! - `node_started` — a node is about to run
//! - `message`      — a node appended a message to the conversation
//! - `tool_call`    — an appended AI message requests a tool
//! - `tool_result`  — a tool finished
//! - `done`         — the run reached `Done`
//! - `error`        — the run failed

use paperscout_core::error::RunFailed;
use paperscout_core::message::Message;
use serde::{Deserialize, Serialize};

use crate::graph::Node;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentStreamEvent {
    /// A node is about to run.
    NodeStarted { node: Node },

    /// A node appended a message.
    Message { node: Node, message: Message },

    /// An appended AI message requests a tool.
    ToolCall {
        id: String,
        name: String,
        input: serde_json::Value,
    },

    /// Tool execution completed.
    ToolResult {
        id: String,
        name: String,
        output: String,
        success: bool,
    },

    /// The run is complete.
    Done {
        run_id: String,
        nodes_visited: usize,
        feedback_requests: u32,
    },

    /// The run failed.
    Error {
        message: String,
        #[serde(skip)]
        failure: Option<RunFailed>,
    },
}

impl AgentStreamEvent {
    /// Event name for this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::NodeStarted { .. } => "node_started",
            Self::Message { .. } => "message",
            Self::ToolCall { .. } => "tool_call",
            Self::ToolResult { .. } => "tool_result",
            Self::Done { .. } => "done",
            Self::Error { .. } => "error",
        }
    }

    pub(crate) fn failed(failure: RunFailed) -> Self {
        Self::Error {
            message: failure.to_string(),
            failure: Some(failure),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serialization_message() {
        let event = AgentStreamEvent::Message {
            node: Node::Synthesize,
            message: Message::assistant("Hello"),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"message""#));
        assert!(json.contains(r#""node":"synthesize""#));
        assert!(json.contains(r#""content":"Hello""#));
    }

    #[test]
    fn event_serialization_tool_call() {
        let event = AgentStreamEvent::ToolCall {
            id: "search-papers-1".into(),
            name: "search-papers".into(),
            input: serde_json::json!({"query": "attention"}),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"tool_call""#));
        assert!(json.contains(r#""name":"search-papers""#));
    }

    #[test]
    fn error_event_keeps_failure_out_of_json() {
        let event = AgentStreamEvent::failed(RunFailed::NoOutput);
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(
            json,
            r#"{"type":"error","message":"Run finished without producing any message"}"#
        );

        let back: AgentStreamEvent = serde_json::from_str(&json).unwrap();
        match back {
            AgentStreamEvent::Error { failure, .. } => assert!(failure.is_none()),
            other => panic!("Wrong variant: {other:?}"),
        }
    }

    #[test]
    fn event_type_names() {
        assert_eq!(
            AgentStreamEvent::NodeStarted { node: Node::Decide }.event_type(),
            "node_started"
        );
        assert_eq!(
            AgentStreamEvent::Done {
                run_id: "r".into(),
                nodes_visited: 1,
                feedback_requests: 0
            }
            .event_type(),
            "done"
        );
        assert_eq!(AgentStreamEvent::failed(RunFailed::NoOutput).event_type(), "error");
    }
}
