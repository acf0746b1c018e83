//! Error types for the PaperScout domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant; `RunFailed` is the only
//! error a caller of the agent loop ever sees.

use thiserror::Error;

/// The top-level error type for all PaperScout operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Language model errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Agent run errors ---
    #[error(transparent)]
    Run(#[from] RunFailed),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures talking to the language model. Every variant means the model is
/// unavailable for the current step.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// The model's reply could not be read as the requested decision shape.
#[derive(Debug, Clone, Error)]
pub enum DecisionParseError {
    #[error("no JSON object found in {shape} reply")]
    MissingObject { shape: &'static str },

    #[error("invalid {shape} JSON: {reason}")]
    InvalidJson { shape: &'static str, reason: String },
}

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Tool timed out: {tool_name} after {timeout_secs}s")]
    Timeout { tool_name: String, timeout_secs: u64 },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("No human responder available: {0}")]
    HumanUnavailable(String),
}

/// A run of the agent loop did not produce an answer.
#[derive(Debug, Clone, Error)]
pub enum RunFailed {
    #[error("Run failed in {node} node: {source}")]
    ModelUnavailable {
        node: &'static str,
        #[source]
        source: ProviderError,
    },

    #[error("Run aborted on contract violation: {0}")]
    ContractViolation(String),

    #[error("Run cancelled before the {node} node")]
    Cancelled { node: &'static str },

    #[error("Run finished without producing any message")]
    NoOutput,

    #[error("Run ended abnormally: {0}")]
    Interrupted(String),
}
