//! Shared test doubles for agent tests.

use async_trait::async_trait;
use paperscout_core::error::{ProviderError, ToolError};
use paperscout_core::model::LanguageModel;
use paperscout_core::tool::{Tool, ToolRegistry, ToolResult};
use std::collections::VecDeque;
use std::sync::Mutex;

/// A model that returns scripted replies in order and records every prompt.
///
/// Once the script is exhausted every call fails with `NotConfigured`.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ProviderError::NotConfigured("script exhausted".into()))
    }
}

/// A model whose reply is computed from the prompt.
pub struct FnModel<F>(pub F);

#[async_trait]
impl<F> LanguageModel for FnModel<F>
where
    F: Fn(&str) -> Result<String, ProviderError> + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        "fn"
    }

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        (self.0)(prompt)
    }
}

/// Stands in for `search-papers`: echoes the query back.
pub struct EchoSearchTool;

#[async_trait]
impl Tool for EchoSearchTool {
    fn name(&self) -> &str {
        "search-papers"
    }

    fn description(&self) -> &str {
        "Search for scientific papers"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": { "query": { "type": "string" } },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let query = arguments["query"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'query' argument".into()))?;
        Ok(ToolResult::ok(format!("results for: {query}")))
    }
}

/// Stands in for `download-paper`: always fails.
pub struct FailingTool;

#[async_trait]
impl Tool for FailingTool {
    fn name(&self) -> &str {
        "download-paper"
    }

    fn description(&self) -> &str {
        "Download a paper"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": { "url": { "type": "string" } },
            "required": ["url"]
        })
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        Err(ToolError::ExecutionFailed {
            tool_name: "download-paper".into(),
            reason: "Got non 2xx when downloading paper: 404 gone".into(),
        })
    }
}

pub fn registry(tools: Vec<Box<dyn Tool>>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    for tool in tools {
        registry.register(tool);
    }
    registry
}
