//! The research agent's control loop.
//!
//! A run moves through five nodes:
//!
//! 1. **Decide** whether the question needs research at all
//! 2. **Plan** the research steps, given the available tools
//! 3. **Synthesize** an answer, possibly requesting a tool
//! 4. **Act** on tool requests and append their results
//! 5. **Judge** the answer, looping back to Plan with feedback
//!
//! Routing lives in [`graph::transition`]; node behaviour in `nodes`;
//! [`ResearchAgent`] drives the loop and reports progress as
//! [`AgentStreamEvent`]s and [`DomainEvent`](paperscout_core::DomainEvent)s.

pub mod collector;
pub mod compare;
pub mod directive;
pub mod graph;
pub(crate) mod nodes;
pub mod prompts;
pub mod runner;
pub mod state;
pub mod stream_event;

#[cfg(test)]
mod test_helpers;

pub use collector::StreamCollector;
pub use compare::{DEFAULT_FOCUS, compare_documents};
pub use directive::{Completion, parse_completion};
pub use graph::{Limits, Node, transition};
pub use runner::{ResearchAgent, RunOutcome};
pub use state::{AgentState, NodeUpdate, ToolRun};
pub use stream_event::AgentStreamEvent;
