//! Model router — builds language models from config and picks the default.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use paperscout_config::AppConfig;
use paperscout_core::error::ProviderError;
use paperscout_core::model::LanguageModel;

use tracing::debug;

use crate::fallback::FallbackModel;
use crate::openai_compat::OpenAiCompatModel;

/// Routes completions to the configured model backend.
pub struct ModelRouter {
    models: HashMap<String, Arc<dyn LanguageModel>>,
    default_provider: String,
}

impl ModelRouter {
    /// Create a new router with a default provider.
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            models: HashMap::new(),
            default_provider: default_provider.into(),
        }
    }

    /// Register a model under a provider name.
    pub fn register(&mut self, name: impl Into<String>, model: Arc<dyn LanguageModel>) {
        self.models.insert(name.into(), model);
    }

    /// Get the default model.
    pub fn default_model(&self) -> Option<Arc<dyn LanguageModel>> {
        self.models.get(&self.default_provider).cloned()
    }

    /// Get a specific model by provider name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn LanguageModel>> {
        self.models.get(name).cloned()
    }

    /// List all registered provider names, sorted.
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.models.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

/// Build models from configuration.
///
/// Every `[providers.<name>]` table becomes a model; the default provider is
/// always present even when it has no table of its own. With
/// `fallback_providers` set, the default model is a [`FallbackModel`] that
/// tries the default provider first and then each fallback in order.
pub fn build_from_config(config: &AppConfig) -> Result<ModelRouter, ProviderError> {
    let mut router = ModelRouter::new(&config.default_provider);

    for name in config.providers.keys() {
        router.register(name.clone(), Arc::new(provider_model(name, config)?));
    }

    let mut chain = vec![config.default_provider.as_str()];
    chain.extend(config.fallback_providers.iter().map(String::as_str));
    for name in &chain {
        if router.get(name).is_none() {
            router.register(*name, Arc::new(provider_model(name, config)?));
        }
    }

    if !config.fallback_providers.is_empty() {
        let limit = Duration::from_secs(config.request_timeout_secs);
        let mut fallback = FallbackModel::new(&config.default_provider);
        for name in &chain {
            if let Some(model) = router.get(name) {
                fallback = fallback.add(model, limit);
            }
        }
        debug!(chain = ?fallback.models(), "Default model falls back");
        router.register(config.default_provider.clone(), Arc::new(fallback));
    }

    Ok(router)
}

/// A model for provider `name`, from its `[providers.<name>]` table if any.
fn provider_model(name: &str, config: &AppConfig) -> Result<OpenAiCompatModel, ProviderError> {
    let table = config.providers.get(name);
    let api_key = match table.and_then(|t| t.api_key.clone()).or_else(|| config.api_key.clone()) {
        Some(key) => key,
        None if name == "ollama" => "ollama".to_string(),
        None => String::new(),
    };
    let base_url = table
        .and_then(|t| t.api_url.clone())
        .unwrap_or_else(|| default_base_url(name));
    let model_name = table
        .and_then(|t| t.default_model.clone())
        .unwrap_or_else(|| config.default_model.clone());

    configure(OpenAiCompatModel::new(name, base_url, api_key, model_name)?, config)
}

fn configure(model: OpenAiCompatModel, config: &AppConfig) -> Result<OpenAiCompatModel, ProviderError> {
    model
        .with_temperature(config.default_temperature)
        .with_max_tokens(config.default_max_tokens)
        .with_timeout(Duration::from_secs(config.request_timeout_secs))
}

/// Get the default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "openai" => "https://api.openai.com/v1".into(),
        "mistral" => "https://api.mistral.ai/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "groq" => "https://api.groq.com/openai/v1".into(),
        "together" => "https://api.together.xyz/v1".into(),
        "vllm" => "http://localhost:8000/v1".into(),
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperscout_config::ProviderConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn router_register_and_lookup() {
        let mut router = ModelRouter::new("openrouter");
        let model = OpenAiCompatModel::openrouter("sk-test", "mistral").unwrap();
        router.register("openrouter", Arc::new(model));

        assert!(router.get("openrouter").is_some());
        assert!(router.get("nonexistent").is_none());
        assert!(router.default_model().is_some());
    }

    #[test]
    fn default_base_urls() {
        assert!(default_base_url("openrouter").contains("openrouter.ai"));
        assert!(default_base_url("mistral").contains("api.mistral.ai"));
        assert!(default_base_url("ollama").contains("localhost:11434"));
    }

    #[test]
    fn build_from_default_config() {
        let config = AppConfig::default();
        let router = build_from_config(&config).unwrap();
        let model = router.default_model().unwrap();
        assert_eq!(model.name(), "ollama");
    }

    #[test]
    fn configured_providers_are_registered() {
        let mut config = AppConfig::default();
        config.default_provider = "openrouter".into();
        config.providers.insert(
            "openrouter".into(),
            ProviderConfig {
                api_key: Some("sk-or".into()),
                api_url: None,
                default_model: Some("mistralai/mistral-7b-instruct".into()),
            },
        );

        let router = build_from_config(&config).unwrap();
        assert_eq!(router.list(), vec!["openrouter"]);
        assert_eq!(router.default_model().unwrap().name(), "openrouter");
    }

    #[test]
    fn fallback_providers_wrap_the_default_model() {
        let mut config = AppConfig::default();
        config.api_key = Some("sk-test".into());
        config.fallback_providers = vec!["openrouter".into(), "groq".into()];

        let router = build_from_config(&config).unwrap();
        assert_eq!(router.list(), vec!["groq", "ollama", "openrouter"]);
        assert_eq!(router.default_model().unwrap().name(), "ollama");
        assert_eq!(router.get("openrouter").unwrap().name(), "openrouter");
    }

    #[tokio::test]
    async fn default_model_falls_back_when_primary_is_down() {
        let primary = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .expect(1)
            .mount(&primary)
            .await;

        let backup = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "from backup"}}]
            })))
            .expect(1)
            .mount(&backup)
            .await;

        let mut config = AppConfig::default();
        config.default_provider = "primary".into();
        config.fallback_providers = vec!["backup".into()];
        for (name, server) in [("primary", &primary), ("backup", &backup)] {
            config.providers.insert(
                name.into(),
                ProviderConfig {
                    api_key: Some("k".into()),
                    api_url: Some(server.uri()),
                    default_model: None,
                },
            );
        }

        let model = build_from_config(&config).unwrap().default_model().unwrap();
        assert_eq!(model.complete("hi").await.unwrap(), "from backup");
    }
}
