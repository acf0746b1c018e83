//! Node behaviour: each node reads the state, talks to the model or the
//! tools, and returns the update it wants applied.
//!
//! Only model transport failures escape a node. Tool failures become
//! `Error: ...` tool results and unreadable decisions become defaults.

use std::time::Instant;

use paperscout_core::error::ProviderError;
use paperscout_core::message::{Message, MessageToolCall};
use paperscout_core::model::{JudgeDecision, LanguageModel, ResearchDecision, StructuredOutput};
use paperscout_core::tool::{ToolCall, ToolRegistry};
use tracing::{debug, warn};

use crate::directive::{Completion, parse_completion};
use crate::graph::Node;
use crate::prompts;
use crate::state::{AgentState, NodeUpdate, ToolRun};

/// Shared collaborators a node may use.
pub(crate) struct NodeContext<'a> {
    pub model: &'a dyn LanguageModel,
    pub tools: &'a ToolRegistry,
}

pub(crate) async fn execute(
    node: Node,
    ctx: &NodeContext<'_>,
    state: &AgentState,
) -> Result<NodeUpdate, ProviderError> {
    match node {
        Node::Decide => decide(ctx, state).await,
        Node::Plan => plan(ctx, state).await,
        Node::Act => Ok(act(ctx, state).await),
        Node::Synthesize => synthesize(ctx, state).await,
        Node::Judge => judge(ctx, state).await,
        Node::Done => Ok(NodeUpdate::default()),
    }
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.trim().is_empty())
}

async fn decide(ctx: &NodeContext<'_>, state: &AgentState) -> Result<NodeUpdate, ProviderError> {
    let prompt = prompts::render_conversation(prompts::DECISION_MAKING_PROMPT, state.messages());
    let decision: ResearchDecision = ctx.model.decide(&prompt).await?;

    debug!(requires_research = decision.requires_research, "Decision made");

    Ok(NodeUpdate {
        requires_research: Some(decision.requires_research),
        ..NodeUpdate::default()
    }
    .with_optional_message(non_empty(decision.answer).map(Message::assistant)))
}

async fn plan(ctx: &NodeContext<'_>, state: &AgentState) -> Result<NodeUpdate, ProviderError> {
    let system = prompts::planning_prompt(&ctx.tools.describe());
    let prompt = prompts::render_conversation(&system, state.messages());
    let plan = ctx.model.complete(&prompt).await?;
    Ok(NodeUpdate::message(Message::assistant(plan)))
}

async fn act(ctx: &NodeContext<'_>, state: &AgentState) -> NodeUpdate {
    let requests = match state.last_message() {
        Some(message) if message.has_pending_tool_calls() => message.tool_calls.clone(),
        _ => Vec::new(),
    };

    let mut update = NodeUpdate::default();
    for request in requests {
        let call = ToolCall {
            id: request.id.clone(),
            name: request.name.clone(),
            arguments: request.arguments.clone(),
        };

        let start = Instant::now();
        let (content, success) = match ctx.tools.invoke(&call).await {
            Ok(result) => (result.output, result.success),
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Tool failed");
                (format!("Error: {e}"), false)
            }
        };
        let duration_ms = start.elapsed().as_millis() as u64;

        update
            .messages
            .push(Message::tool_result(&call.id, &call.name, content));
        update.tool_runs.push(ToolRun {
            call_id: call.id,
            tool_name: call.name,
            success,
            duration_ms,
        });
    }
    update
}

async fn synthesize(ctx: &NodeContext<'_>, state: &AgentState) -> Result<NodeUpdate, ProviderError> {
    let findings: Vec<&str> = state
        .trailing_tool_results()
        .iter()
        .map(|m| m.content.as_str())
        .collect();

    if !findings.is_empty() {
        debug!(results = findings.len(), "Summarizing tool results");
        let summary = ctx.model.complete(&prompts::summarize_prompt(&findings)).await?;
        return Ok(NodeUpdate::message(Message::assistant(summary)));
    }

    let prompt = prompts::render_conversation(prompts::AGENT_PROMPT, state.messages());
    let reply = ctx.model.complete(&prompt).await?;

    let message = match parse_completion(&reply) {
        Completion::ToolCall { text, name, arguments } if ctx.tools.contains(&name) => {
            debug!(tool = %name, "Tool call requested");
            Message::assistant(text).with_tool_call(MessageToolCall::new(name, arguments))
        }
        Completion::ToolCall { text, name, .. } => {
            warn!(tool = %name, "Ignoring request for unknown tool");
            Message::assistant(text)
        }
        Completion::PlainText(text) => Message::assistant(text),
    };
    Ok(NodeUpdate::message(message))
}

async fn judge(ctx: &NodeContext<'_>, state: &AgentState) -> Result<NodeUpdate, ProviderError> {
    let prompt = prompts::render_conversation(prompts::JUDGE_PROMPT, state.messages());
    let verdict: JudgeDecision = ctx.model.decide(&prompt).await?;

    debug!(is_good_answer = verdict.is_good_answer, "Answer judged");

    Ok(NodeUpdate {
        is_good_answer: Some(verdict.is_good_answer),
        feedback_requested: true,
        ..NodeUpdate::default()
    }
    .with_optional_message(non_empty(verdict.feedback).map(Message::assistant)))
}
