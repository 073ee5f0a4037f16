//! Provider router: maps each pipeline stage to its provider and model.

use crate::anthropic::AnthropicProvider;
use crate::openai::OpenAiProvider;
use copyforge_config::{AppConfig, ProviderKind, Service};
use copyforge_core::provider::Provider;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::warn;

struct Route {
    provider: Arc<dyn Provider>,
    model: String,
}

/// Routes stage requests to the correct provider.
pub struct ProviderRouter {
    providers: HashMap<String, Route>,
    assignments: BTreeMap<String, String>,
    fallback: String,
}

impl ProviderRouter {
    /// Create a router. Stages without an assignment use `fallback`.
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            providers: HashMap::new(),
            assignments: BTreeMap::new(),
            fallback: fallback.into(),
        }
    }

    /// Register a provider with the model it should be asked for.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>, model: impl Into<String>) {
        self.providers.insert(
            name.into(),
            Route {
                provider,
                model: model.into(),
            },
        );
    }

    /// Assign a stage to a registered provider name.
    pub fn assign(&mut self, stage: impl Into<String>, provider: impl Into<String>) {
        self.assignments.insert(stage.into(), provider.into());
    }

    /// Get a specific provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).map(|r| r.provider.clone())
    }

    /// Provider and model for a stage, falling back to the default provider
    /// when the stage is unassigned.
    pub fn for_stage(&self, stage: &str) -> Option<(Arc<dyn Provider>, String)> {
        let name = match self.assignments.get(stage) {
            Some(name) => name.as_str(),
            None => {
                warn!(stage, fallback = %self.fallback, "Stage has no provider assignment");
                self.fallback.as_str()
            }
        };
        self.providers
            .get(name)
            .map(|route| (route.provider.clone(), route.model.clone()))
    }

    /// All registered provider names, sorted.
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

/// Build both providers and the stage assignments from configuration.
///
/// Providers are registered even without a key; the missing credential
/// surfaces when a stage first calls them.
pub fn build_from_config(config: &AppConfig) -> ProviderRouter {
    let mut router = ProviderRouter::new(ProviderKind::OpenAi.as_str());
    let key = |service: Service| config.api_key_for(service).ok().map(str::to_string);

    let mut anthropic = AnthropicProvider::new(key(Service::Anthropic));
    if let Some(url) = &config.models.anthropic_base_url {
        anthropic = anthropic.with_base_url(url);
    }
    router.register(
        ProviderKind::Anthropic.as_str(),
        Arc::new(anthropic),
        config.models.model_for(ProviderKind::Anthropic),
    );

    let mut openai = OpenAiProvider::new(key(Service::OpenAi));
    if let Some(url) = &config.models.openai_base_url {
        openai = openai.with_base_url(url);
    }
    router.register(
        ProviderKind::OpenAi.as_str(),
        Arc::new(openai),
        config.models.model_for(ProviderKind::OpenAi),
    );

    for (stage, provider) in &config.stage_providers {
        router.assign(stage.clone(), provider.as_str());
    }

    router
}
