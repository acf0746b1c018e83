//! Fallback chain: the default model first, then each configured fallback.
//!
//! Every entry gets its own timeout. A failure or timeout moves on to the
//! next entry; the run only sees an error once the whole chain is spent.

use async_trait::async_trait;
use paperscout_core::error::ProviderError;
use paperscout_core::model::LanguageModel;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// A language model backed by an ordered chain of models.
pub struct FallbackModel {
    name: String,
    chain: Vec<(Arc<dyn LanguageModel>, Duration)>,
}

impl FallbackModel {
    /// An empty chain reporting itself as `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            chain: Vec::new(),
        }
    }

    /// Append a model that gets `timeout` to answer.
    pub fn add(mut self, model: Arc<dyn LanguageModel>, timeout: Duration) -> Self {
        self.chain.push((model, timeout));
        self
    }

    /// Names of the chained models, in the order they are tried.
    pub fn models(&self) -> Vec<&str> {
        self.chain.iter().map(|(model, _)| model.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }
}

#[async_trait]
impl LanguageModel for FallbackModel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let mut last_error = ProviderError::NotConfigured(format!("fallback chain '{}' is empty", self.name));

        for (position, (model, limit)) in self.chain.iter().enumerate() {
            debug!(model = model.name(), position, "Trying model");

            last_error = match tokio::time::timeout(*limit, model.complete(prompt)).await {
                Ok(Ok(text)) => return Ok(text),
                Ok(Err(e)) => e,
                Err(_) => ProviderError::Timeout(format!(
                    "model '{}' gave no answer within {}s",
                    model.name(),
                    limit.as_secs_f32()
                )),
            };

            if position + 1 < self.chain.len() {
                warn!(model = model.name(), error = %last_error, "Model failed, falling back");
            }
        }

        Err(last_error)
    }
}
