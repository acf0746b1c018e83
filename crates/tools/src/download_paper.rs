//! `download-paper` — fetch a paper PDF and return its text.

use async_trait::async_trait;
use paperscout_config::{ConfigError, RetryConfig};
use paperscout_core::error::ToolError;
use paperscout_core::tool::{Tool, ToolResult};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT};
use std::time::Duration;
use tracing::debug;

use crate::pdf;
use crate::retry::{RetryPolicy, send_with_retry};

const TOOL_NAME: &str = "download-paper";

/// Sent with every download; paper hosts often reject non-browser agents.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

pub struct DownloadPaperTool {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl DownloadPaperTool {
    pub fn new(retry: &RetryConfig, timeout: Duration) -> Result<Self, ConfigError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::ValidationError(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            retry: RetryPolicy::from(retry),
        })
    }
}

#[async_trait]
impl Tool for DownloadPaperTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Download a specific scientific paper from a given URL. \
         Example: {\"url\": \"https://sample.pdf\"}. Returns the paper content."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "Direct URL of the paper PDF"
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let url = arguments["url"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'url' argument".into()))?;

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ToolError::InvalidArguments(
                "URL must start with http:// or https://".into(),
            ));
        }

        debug!(url, "Downloading paper");

        let failed = |reason: String| ToolError::ExecutionFailed {
            tool_name: TOOL_NAME.into(),
            reason,
        };

        let response = send_with_retry(&self.retry, || self.client.get(url))
            .await
            .map_err(|e| failed(format!("Got non 2xx when downloading paper: {e}")))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| failed(format!("Failed to read response body: {e}")))?;
        let text = pdf::extract_text(&bytes).map_err(|e| failed(e.to_string()))?;

        Ok(ToolResult::ok(text))
    }
}
