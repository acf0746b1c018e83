//! Language model implementations for PaperScout.
//!
//! All models implement the `paperscout_core::LanguageModel` trait.
//! The router selects the correct backend based on configuration.

pub mod fallback;
pub mod openai_compat;
pub mod router;

pub use fallback::FallbackModel;
pub use openai_compat::OpenAiCompatModel;
pub use router::{ModelRouter, build_from_config};
