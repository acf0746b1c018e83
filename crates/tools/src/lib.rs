//! Research tools for PaperScout.
//!
//! Tools give the agent the ability to do research: search the CORE paper
//! index, download a paper and read its text, and ask the human a question.
//! Citation extraction is a plain function used by the CLI.

pub mod ask_human;
pub mod citation;
pub mod download_paper;
pub mod pdf;
pub mod retry;
pub mod search_papers;

use std::time::Duration;

use paperscout_config::{AppConfig, ConfigError};
use paperscout_core::tool::ToolRegistry;

pub use ask_human::{AskHumanTool, PendingQuestion, human_channel};
pub use citation::{Citation, extract_citations};
pub use download_paper::DownloadPaperTool;
pub use retry::RetryPolicy;
pub use search_papers::SearchPapersTool;

/// Create the research tool registry: `search-papers`, `download-paper`,
/// `ask-human-feedback`, in that order.
///
/// Fails with `MissingCredential` when no CORE API key is configured.
pub fn research_registry(config: &AppConfig, human: AskHumanTool) -> Result<ToolRegistry, ConfigError> {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(SearchPapersTool::new(&config.core_api, &config.retry)?));
    registry.register(Box::new(DownloadPaperTool::new(
        &config.retry,
        Duration::from_secs(config.request_timeout_secs),
    )?));
    registry.register(Box::new(human));
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_requires_core_key() {
        let config = AppConfig::default();
        let (human, _rx) = human_channel(1, None);
        let err = research_registry(&config, human).err().unwrap();
        assert!(matches!(err, ConfigError::MissingCredential { ref name } if name == "CORE_API_KEY"));
    }

    #[test]
    fn registry_lists_tools_in_order() {
        let mut config = AppConfig::default();
        config.core_api.api_key = Some("core-key".into());
        let (human, _rx) = human_channel(1, None);

        let registry = research_registry(&config, human).unwrap();
        assert_eq!(
            registry.names(),
            vec!["search-papers", "download-paper", "ask-human-feedback"]
        );
        let description = registry.describe();
        assert!(description.starts_with("- search-papers: "));
        assert!(description.contains("\"max_papers\""));
    }
}
