//! The control loop's nodes and its transition table.
//!
//! ```text
//! Decide ──research──▶ Plan ──▶ Synthesize ──tool call──▶ Act
//!   │                   ▲            │  ▲                  │
//!   └──no research──▶ Done           │  └──────────────────┘
//!                       ▲            ▼
//!                       └──good── Judge ──needs work──▶ Plan
//! ```
//!
//! `transition` is a pure function of the node just executed and the state
//! it left behind, so routing can be tested without running any node.

use paperscout_config::AgentSettings;
use serde::{Deserialize, Serialize};

use crate::state::AgentState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    Decide,
    Plan,
    Act,
    Synthesize,
    Judge,
    Done,
}

impl Node {
    pub fn as_str(&self) -> &'static str {
        match self {
            Node::Decide => "decide",
            Node::Plan => "plan",
            Node::Act => "act",
            Node::Synthesize => "synthesize",
            Node::Judge => "judge",
            Node::Done => "done",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Node::Done)
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bounds on the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum Judge → Plan cycles. `None` loops until Judge approves.
    pub max_feedback_cycles: Option<u32>,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_feedback_cycles: Some(3),
        }
    }
}

impl Limits {
    pub fn unbounded() -> Self {
        Self {
            max_feedback_cycles: None,
        }
    }

    /// Whether another Judge → Plan cycle is allowed after `judge_visits`.
    fn allows_another_cycle(&self, judge_visits: u32) -> bool {
        match self.max_feedback_cycles {
            Some(max) => judge_visits.saturating_sub(1) < max,
            None => true,
        }
    }
}

impl From<&AgentSettings> for Limits {
    fn from(settings: &AgentSettings) -> Self {
        Self {
            max_feedback_cycles: settings.max_feedback_cycles,
        }
    }
}

/// Pick the node that follows `node`, given the state it produced.
pub fn transition(node: Node, state: &AgentState, limits: &Limits) -> Node {
    match node {
        Node::Decide if state.requires_research() => Node::Plan,
        Node::Decide => Node::Done,
        Node::Plan => Node::Synthesize,
        Node::Act => Node::Synthesize,
        Node::Synthesize => match state.last_message() {
            Some(message) if message.has_pending_tool_calls() => Node::Act,
            _ => Node::Judge,
        },
        Node::Judge if state.is_good_answer() => Node::Done,
        Node::Judge if limits.allows_another_cycle(state.num_feedback_requests()) => Node::Plan,
        Node::Judge => Node::Done,
        Node::Done => Node::Done,
    }
}
