//! Prompt templates for the control loop nodes.

use paperscout_core::message::Message;

pub const DECISION_MAKING_PROMPT: &str = "You are an experienced scientific researcher. \
Your goal is to help the user with their scientific research. \
Based on the user query, decide if you need to perform research or if you can answer the question directly. \
You should perform research if the answer requires up-to-date information, a review of the literature, \
or a specific paper. If you can answer directly, put the full answer in the `answer` field.";

pub const PLANNING_PROMPT: &str = "You are an experienced scientific researcher. \
Your goal is to make a new step by step plan to help the user with their scientific research.

Subtasks should not rely on any assumptions or guesses, but only rely on the information provided \
in the context or look up for any additional information.

If any feedback is provided about a previous answer, incorporate it in your new planning.

# Tools
For each subtask, indicate the external tool required to complete it. The available tools are:
{tools}";

pub const AGENT_PROMPT: &str = "You are an experienced scientific researcher. \
Your goal is to help the user with their scientific research by executing the current step of the plan.

To use a tool, reply with exactly these two lines and nothing else on them:
TOOL: <tool name>
ARGS: <JSON object with the tool arguments>

Use one tool at a time. If no tool is needed, answer with plain text and do not write a TOOL line.";

pub const JUDGE_PROMPT: &str = "You are an expert scientific researcher. \
Your goal is to review the final answer you provided for a specific user query.

Look at the conversation history between you and the user. Based on it, decide if the final answer \
is satisfactory. A good answer is relevant, answers the question completely, and is supported by \
the research performed. If it is not good, explain in `feedback` what must be improved.";

/// Render a system instruction followed by the history as
/// `"<type>: <content>"` lines.
pub fn render_conversation(system: &str, messages: &[Message]) -> String {
    std::iter::once(format!("system: {system}"))
        .chain(messages.iter().map(Message::prompt_line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The planning instruction with the tool descriptions filled in.
pub fn planning_prompt(tool_descriptions: &str) -> String {
    PLANNING_PROMPT.replace("{tools}", tool_descriptions)
}

/// Prompt asking for a summary of unsummarized tool outputs.
pub fn summarize_prompt(tool_outputs: &[&str]) -> String {
    format!(
        "Process and summarize the following research results:\n{}",
        tool_outputs.join("\n\n")
    )
}
