//! Stage authors: the text-in/text-out services that write each stage.

use crate::stage::StageDescriptor;
use async_trait::async_trait;
use copyforge_config::ModelConfig;
use copyforge_core::error::ProviderError;
use copyforge_core::message::Message;
use copyforge_core::provider::ProviderRequest;
use copyforge_providers::ProviderRouter;
use tracing::debug;

/// The prompt handed to an author for one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagePrompt {
    pub system: String,
    pub user: String,
}

/// Produces the text artifact for a stage.
#[async_trait]
pub trait StageAuthor: Send + Sync {
    async fn author(&self, stage: &StageDescriptor, prompt: &StagePrompt) -> Result<String, ProviderError>;
}

/// Author backed by the provider assigned to each stage.
pub struct LlmAuthor {
    router: ProviderRouter,
    temperature: f32,
    max_tokens: u32,
}

impl LlmAuthor {
    pub fn new(router: ProviderRouter, models: &ModelConfig) -> Self {
        Self {
            router,
            temperature: models.temperature,
            max_tokens: models.max_tokens,
        }
    }
}

#[async_trait]
impl StageAuthor for LlmAuthor {
    async fn author(&self, stage: &StageDescriptor, prompt: &StagePrompt) -> Result<String, ProviderError> {
        let (provider, model) = self.router.for_stage(stage.name).ok_or_else(|| {
            ProviderError::NotConfigured(format!("No provider available for stage '{}'", stage.name))
        })?;

        debug!(stage = stage.name, provider = provider.name(), model = %model, "Authoring stage");

        let request = ProviderRequest::new(
            model,
            vec![Message::system(&prompt.system), Message::user(&prompt.user)],
        )
        .with_temperature(self.temperature)
        .with_max_tokens(self.max_tokens);

        let response = provider.complete(request).await?;
        let text = response.message.content.trim().to_string();
        if text.is_empty() {
            return Err(ProviderError::InvalidResponse(format!(
                "{} returned an empty artifact for stage '{}'",
                provider.name(),
                stage.name
            )));
        }
        Ok(text)
    }
}
