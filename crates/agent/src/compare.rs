//! Side-by-side comparison of two papers.

use paperscout_core::error::ProviderError;
use paperscout_core::model::LanguageModel;
use tracing::debug;

/// Aspect compared when the caller names none.
pub const DEFAULT_FOCUS: &str = "methodology";

/// Ask `model` to compare two documents, focusing on one aspect.
pub async fn compare_documents(
    model: &dyn LanguageModel,
    paper_a: &str,
    paper_b: &str,
    focus: Option<&str>,
) -> Result<String, ProviderError> {
    let focus = focus
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .unwrap_or(DEFAULT_FOCUS);
    debug!(focus, model = model.name(), "Comparing documents");
    model.complete(&comparison_prompt(paper_a, paper_b, focus)).await
}

fn comparison_prompt(paper_a: &str, paper_b: &str, focus: &str) -> String {
    format!(
        "Compare these two papers focusing on {focus}:\n--- Paper A ---\n{paper_a}\n--- Paper B ---\n{paper_b}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::ScriptedModel;

    #[tokio::test]
    async fn defaults_to_methodology() {
        let model = ScriptedModel::new(["A uses surveys, B uses simulations."]);
        let reply = compare_documents(&model, "survey study", "simulation study", None)
            .await
            .unwrap();

        assert_eq!(reply, "A uses surveys, B uses simulations.");
        assert_eq!(
            model.prompts()[0],
            "Compare these two papers focusing on methodology:\n--- Paper A ---\nsurvey study\n--- Paper B ---\nsimulation study"
        );
    }

    #[tokio::test]
    async fn custom_focus_is_used() {
        let model = ScriptedModel::new(["ok"]);
        compare_documents(&model, "a", "b", Some("datasets")).await.unwrap();
        assert!(model.prompts()[0].starts_with("Compare these two papers focusing on datasets:"));

        let model = ScriptedModel::new(["ok"]);
        compare_documents(&model, "a", "b", Some("  ")).await.unwrap();
        assert!(model.prompts()[0].contains("focusing on methodology:"));
    }

    #[tokio::test]
    async fn model_failure_propagates() {
        let model = ScriptedModel::new(Vec::<&str>::new());
        let err = compare_documents(&model, "a", "b", None).await.unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
    }
}
