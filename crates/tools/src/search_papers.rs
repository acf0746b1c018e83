//! `search-papers` — full-text search over the CORE v3 paper index.

use async_trait::async_trait;
use paperscout_config::{ConfigError, CoreApiConfig, RetryConfig};
use paperscout_core::error::ToolError;
use paperscout_core::tool::{Tool, ToolResult};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::retry::{RetryPolicy, send_with_retry};

const TOOL_NAME: &str = "search-papers";
const MAX_PAPERS: u64 = 10;

pub struct SearchPapersTool {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    retry: RetryPolicy,
}

impl SearchPapersTool {
    /// Build the tool from config. Fails when no CORE API key is set.
    pub fn new(core: &CoreApiConfig, retry: &RetryConfig) -> Result<Self, ConfigError> {
        let api_key = core.require_api_key()?.to_string();
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(core.timeout_secs))
            .build()
            .map_err(|e| ConfigError::ValidationError(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: core.base_url.trim_end_matches('/').to_string(),
            api_key,
            retry: RetryPolicy::from(retry),
        })
    }

    async fn search(&self, query: &str, limit: u64) -> Result<String, ToolError> {
        let url = format!("{}/search/outputs", self.base_url);
        let limit = limit.to_string();

        debug!(query, limit = %limit, "Searching CORE");

        let response = send_with_retry(&self.retry, || {
            self.client
                .get(&url)
                .bearer_auth(&self.api_key)
                .query(&[("q", query), ("limit", limit.as_str())])
        })
        .await
        .map_err(|e| ToolError::ExecutionFailed {
            tool_name: TOOL_NAME.into(),
            reason: format!("Got non 2xx response from CORE API: {e}"),
        })?;

        let body: SearchResponse = response.json().await.map_err(|e| ToolError::ExecutionFailed {
            tool_name: TOOL_NAME.into(),
            reason: format!("Unreadable CORE API response: {e}"),
        })?;

        Ok(format_results(&body.results))
    }
}

#[async_trait]
impl Tool for SearchPapersTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Search for scientific papers using the CORE API. \
         Example: {\"query\": \"Attention is all you need\", \"max_papers\": 1}. \
         Returns a list of the relevant papers found with the corresponding relevant information."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The query to search for on the selected archive."
                },
                "max_papers": {
                    "type": "integer",
                    "description": "The maximum number of papers to return. It's default to 1, but you can increase it up to 10 in case you need to perform a more comprehensive search.",
                    "minimum": 1,
                    "maximum": MAX_PAPERS,
                    "default": 1
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let query = arguments["query"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'query' argument".into()))?;

        let max_papers = match arguments.get("max_papers") {
            None | Some(serde_json::Value::Null) => 1,
            Some(value) => value
                .as_u64()
                .filter(|n| (1..=MAX_PAPERS).contains(n))
                .ok_or_else(|| {
                    ToolError::InvalidArguments(format!(
                        "'max_papers' must be an integer between 1 and {MAX_PAPERS}, got {value}"
                    ))
                })?,
        };

        let output = self.search(query, max_papers).await?;
        Ok(ToolResult::ok(output))
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Paper>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Paper {
    id: Option<serde_json::Value>,
    title: Option<String>,
    published_date: Option<String>,
    year_published: Option<serde_json::Value>,
    authors: Option<Vec<Author>>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    source_fulltext_urls: Option<Vec<String>>,
    download_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Author {
    #[serde(default)]
    name: String,
}

fn format_results(results: &[Paper]) -> String {
    if results.is_empty() {
        return "No relevant results were found".to_string();
    }

    results
        .iter()
        .map(format_paper)
        .collect::<Vec<_>>()
        .join("\n-----\n")
}

fn format_paper(paper: &Paper) -> String {
    let published = paper
        .published_date
        .clone()
        .filter(|d| !d.is_empty())
        .or_else(|| paper.year_published.as_ref().map(plain))
        .unwrap_or_default();
    let authors = paper
        .authors
        .iter()
        .flatten()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(" and ");
    let urls = match paper.source_fulltext_urls.as_deref() {
        Some(urls) if !urls.is_empty() => urls.join(", "),
        _ => paper.download_url.clone().unwrap_or_default(),
    };

    format!(
        "* ID: {},\n* Title: {},\n* Published Date: {},\n* Authors: {},\n* Abstract: {},\n* Paper URLs: {}",
        paper.id.as_ref().map(plain).unwrap_or_default(),
        paper.title.as_deref().unwrap_or_default(),
        published,
        authors,
        paper.abstract_text.as_deref().unwrap_or_default(),
        urls,
    )
}

/// Render a JSON scalar without quotes.
fn plain(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}
