//! Parsing tool-use directives out of free-text completions.
//!
//! The model asks for a tool by writing marker lines anywhere in its reply:
//!
//! ```text
//! TOOL: search-papers
//! ARGS: {"query": "transformer attention", "max_papers": 3}
//! ```
//!
//! The JSON after `ARGS:` may span several lines. A reply with a tool name
//! but no usable argument object is plain text.

use serde_json::Value;

const TOOL_MARKER: &str = "TOOL:";
const ARGS_MARKER: &str = "ARGS:";

/// A completion, classified.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    PlainText(String),
    ToolCall {
        text: String,
        name: String,
        arguments: Value,
    },
}

impl Completion {
    /// The full reply text, whatever its kind.
    pub fn text(&self) -> &str {
        match self {
            Completion::PlainText(text) => text,
            Completion::ToolCall { text, .. } => text,
        }
    }
}

/// Classify a completion. When markers repeat, the last well-formed one wins.
pub fn parse_completion(reply: &str) -> Completion {
    let mut name: Option<&str> = None;
    let mut arguments: Option<Value> = None;

    let mut offset = 0;
    for line in reply.split_inclusive('\n') {
        let trimmed = line.trim_start();
        let indent = line.len() - trimmed.len();

        if let Some(rest) = trimmed.strip_prefix(TOOL_MARKER) {
            let candidate = rest.trim();
            if !candidate.is_empty() {
                name = Some(candidate);
            }
        } else if trimmed.starts_with(ARGS_MARKER) {
            let start = offset + indent + ARGS_MARKER.len();
            if let Some(object) = leading_object(&reply[start..]) {
                arguments = Some(object);
            }
        }

        offset += line.len();
    }

    match (name, arguments) {
        (Some(name), Some(arguments)) => Completion::ToolCall {
            text: reply.to_string(),
            name: name.to_string(),
            arguments,
        },
        _ => Completion::PlainText(reply.to_string()),
    }
}

/// The first JSON value in `input`, if it is a non-empty object.
fn leading_object(input: &str) -> Option<Value> {
    let mut values = serde_json::Deserializer::from_str(input).into_iter::<Value>();
    match values.next() {
        Some(Ok(Value::Object(map))) if !map.is_empty() => Some(Value::Object(map)),
        _ => None,
    }
}
