//! Language model port — "send a prompt, get text or a structured decision back".
//!
//! A `LanguageModel` only knows how to complete prompt text. Structured
//! decisions are layered on top by [`StructuredOutput`], which every model
//! gets for free: it asks for a fixed JSON shape, parses the reply, and
//! degrades to the shape's default when the reply is unreadable.
//!
//! Implementations: OpenAI-compatible endpoints (OpenAI, OpenRouter, Ollama),
//! fallback chains, scripted test doubles.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{DecisionParseError, ProviderError};

/// The core language model trait.
///
/// The agent loop calls `complete()` without knowing which backend answers.
/// Implementations must be safe to share between concurrent runs.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// A human-readable name for this model backend (e.g., "ollama").
    fn name(&self) -> &str;

    /// Complete a prompt. Any error means the model is unavailable.
    async fn complete(&self, prompt: &str) -> std::result::Result<String, ProviderError>;
}

/// A structured output contract requested from the model.
pub trait DecisionShape: DeserializeOwned + Default + Send + 'static {
    /// Shape name used in logs and errors.
    const NAME: &'static str;

    /// The JSON layout the model is asked to answer with.
    fn format_schema() -> serde_json::Value;
}

/// Output of the decision-making step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchDecision {
    pub requires_research: bool,
    pub answer: Option<String>,
}

impl DecisionShape for ResearchDecision {
    const NAME: &'static str = "research decision";

    fn format_schema() -> serde_json::Value {
        serde_json::json!({
            "requires_research": "boolean",
            "answer": "string or null"
        })
    }
}

/// Output of the judging step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JudgeDecision {
    pub is_good_answer: bool,
    pub feedback: Option<String>,
}

impl DecisionShape for JudgeDecision {
    const NAME: &'static str = "judge decision";

    fn format_schema() -> serde_json::Value {
        serde_json::json!({
            "is_good_answer": "boolean",
            "feedback": "string or null"
        })
    }
}

/// Wrap a conversation prompt with the JSON format instruction for `D`.
pub fn structured_prompt<D: DecisionShape>(conversation: &str) -> String {
    format!(
        "Based on the following conversation, provide output in this exact JSON format:\n{}\n\nConversation:\n{}",
        serde_json::to_string_pretty(&D::format_schema()).unwrap_or_default(),
        conversation
    )
}

/// Parse a raw model reply as decision shape `D`.
///
/// Parsing starts at the first `{` and takes the first complete JSON value,
/// so code fences and prose on either side are ignored.
pub fn parse_decision<D: DecisionShape>(raw: &str) -> std::result::Result<D, DecisionParseError> {
    let start = raw
        .find('{')
        .ok_or(DecisionParseError::MissingObject { shape: D::NAME })?;
    match serde_json::Deserializer::from_str(&raw[start..])
        .into_iter::<D>()
        .next()
    {
        Some(Ok(decision)) => Ok(decision),
        Some(Err(e)) => Err(DecisionParseError::InvalidJson {
            shape: D::NAME,
            reason: e.to_string(),
        }),
        None => Err(DecisionParseError::MissingObject { shape: D::NAME }),
    }
}

/// Schema-constrained decisions on top of any [`LanguageModel`].
#[async_trait]
pub trait StructuredOutput: LanguageModel {
    /// Ask for a decision of shape `D`.
    ///
    /// Only transport failures are returned as errors; an unreadable reply
    /// is logged and treated as `D::default()`.
    async fn decide<D: DecisionShape>(&self, prompt: &str) -> std::result::Result<D, ProviderError> {
        let raw = self.complete(&structured_prompt::<D>(prompt)).await?;
        match parse_decision::<D>(&raw) {
            Ok(decision) => Ok(decision),
            Err(e) => {
                warn!(model = %self.name(), error = %e, "Unreadable decision, using default");
                Ok(D::default())
            }
        }
    }
}

impl<M: LanguageModel + ?Sized> StructuredOutput for M {}
