//! Tool trait — the abstraction over agent capabilities.
//!
//! Tools are what let the agent do research: search the paper index,
//! download a paper's full text, or ask the human a question.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::ToolError;

/// A request to execute a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Correlation id (matches the AI message's pending request id)
    pub id: String,

    /// Name of the tool to execute
    pub name: String,

    /// Arguments as a JSON value
    pub arguments: serde_json::Value,
}

/// The result of a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// The call ID this result is for
    pub call_id: String,

    /// Whether the tool executed successfully
    pub success: bool,

    /// The output content
    pub output: String,
}

impl ToolResult {
    /// A successful result with the given output.
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            call_id: String::new(),
            success: true,
            output: output.into(),
        }
    }
}

/// A tool definition sent to the model so it knows what it can call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// The core Tool trait.
///
/// Each tool (search-papers, download-paper, ask-human-feedback) implements
/// this trait. Implementations must be safe to invoke from concurrent runs.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "search-papers").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the model).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given arguments.
    async fn execute(&self, arguments: serde_json::Value) -> std::result::Result<ToolResult, ToolError>;

    /// Convert this tool into a ToolDefinition.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// A registry of available tools, kept in registration order.
///
/// The agent loop uses this to:
/// 1. Describe the tools inside planning prompts
/// 2. Resolve and invoke tools when the model requests them
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Register a tool. Replaces any existing tool with the same name in place.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        match self.tools.iter().position(|t| t.name() == tool.name()) {
            Some(idx) => self.tools[idx] = tool,
            None => self.tools.push(tool),
        }
    }

    /// Resolve a tool by name.
    pub fn resolve(&self, name: &str) -> std::result::Result<&dyn Tool, ToolError> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
            .ok_or_else(|| ToolError::NotFound(name.to_string()))
    }

    /// Whether a tool with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_ok()
    }

    /// All tools in registration order.
    pub fn list(&self) -> Vec<&dyn Tool> {
        self.tools.iter().map(|t| t.as_ref()).collect()
    }

    /// Get all tool definitions, in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.to_definition()).collect()
    }

    /// Format every tool as a prompt-ready description block.
    pub fn describe(&self) -> String {
        self.tools
            .iter()
            .map(|tool| {
                let schema = tool.parameters_schema();
                let args = match schema.get("properties") {
                    Some(props) => format!(
                        "\nInput arguments: {}",
                        serde_json::to_string_pretty(props).unwrap_or_default()
                    ),
                    None => String::new(),
                };
                format!("- {}: {}{}", tool.name(), tool.description(), args)
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Invoke a tool call.
    ///
    /// Unknown names fail with `NotFound`; any failure inside the tool is
    /// reported as `ExecutionFailed` wrapping the cause.
    pub async fn invoke(&self, call: &ToolCall) -> std::result::Result<ToolResult, ToolError> {
        let tool = self.resolve(&call.name)?;
        match tool.execute(call.arguments.clone()).await {
            Ok(mut result) => {
                result.call_id = call.id.clone();
                Ok(result)
            }
            Err(err @ ToolError::ExecutionFailed { .. }) => Err(err),
            Err(other) => Err(ToolError::ExecutionFailed {
                tool_name: call.name.clone(),
                reason: other.to_string(),
            }),
        }
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
