//! # PaperScout Core
//!
//! Domain types, traits, and error definitions for the PaperScout research
//! agent. This crate has **no framework dependencies**: it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every collaborator of the agent loop is defined as a trait here
//! (`LanguageModel`, `Tool`). Implementations live in their respective
//! crates, which keeps the loop testable with scripted doubles.

pub mod error;
pub mod event;
pub mod message;
pub mod model;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{DecisionParseError, Error, ProviderError, Result, RunFailed, ToolError};
pub use event::{DomainEvent, EventBus};
pub use message::{Message, MessageToolCall, Role};
pub use model::{
    DecisionShape, JudgeDecision, LanguageModel, ResearchDecision, StructuredOutput,
};
pub use tool::{Tool, ToolCall, ToolDefinition, ToolRegistry, ToolResult};
