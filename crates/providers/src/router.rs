//! Provider router — selects the LLM provider named in the configuration.

use crate::openai_compat::OpenAiCompatProvider;
use std::collections::HashMap;
use std::sync::Arc;
use steward_core::provider::Provider;

/// Routes LLM requests to the correct provider.
pub struct ProviderRouter {
    providers: HashMap<String, Arc<dyn Provider>>,
    default_provider: String,
}

impl ProviderRouter {
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider.into(),
        }
    }

    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(name.into(), provider);
    }

    pub fn default(&self) -> Option<Arc<dyn Provider>> {
        self.providers.get(&self.default_provider).cloned()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }

    /// All registered provider names, sorted.
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

/// Build providers from configuration.
///
/// Every `[providers.<name>]` table becomes an OpenAI-compatible provider;
/// the default provider is always registered even without a table.
pub fn build_from_config(config: &steward_config::AppConfig) -> ProviderRouter {
    let mut router = ProviderRouter::new(&config.default_provider);

    for (name, provider_config) in &config.providers {
        let api_key = provider_config
            .api_key
            .clone()
            .or_else(|| config.api_key.clone())
            .unwrap_or_default();

        let base_url = provider_config
            .api_url
            .clone()
            .unwrap_or_else(|| default_base_url(name));

        router.register(
            name.clone(),
            Arc::new(OpenAiCompatProvider::new(name, &base_url, &api_key)),
        );
    }

    if router.get(&config.default_provider).is_none() {
        let api_key = config.api_key.clone().unwrap_or_default();
        let base_url = default_base_url(&config.default_provider);
        router.register(
            config.default_provider.clone(),
            Arc::new(OpenAiCompatProvider::new(
                &config.default_provider,
                &base_url,
                &api_key,
            )),
        );
    }

    router
}

/// Default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "openai" => "https://api.openai.com/v1".into(),
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "groq" => "https://api.groq.com/openai/v1".into(),
        "together" => "https://api.together.xyz/v1".into(),
        "vllm" => "http://localhost:8000/v1".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use steward_config::{AppConfig, ProviderConfig};

    #[test]
    fn router_register_and_lookup() {
        let mut router = ProviderRouter::new("openai");
        router.register("openai", Arc::new(OpenAiCompatProvider::openai("sk-test")));

        assert!(router.get("openai").is_some());
        assert!(router.get("nonexistent").is_none());
        assert!(router.default().is_some());
    }

    #[test]
    fn default_base_urls() {
        assert!(default_base_url("openai").contains("api.openai.com"));
        assert!(default_base_url("ollama").contains("localhost:11434"));
    }

    #[test]
    fn build_from_default_config() {
        let router = build_from_config(&AppConfig::default());
        let provider = router.default().unwrap();
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn configured_providers_are_registered() {
        let mut config = AppConfig::default();
        config.providers.insert(
            "ollama".into(),
            ProviderConfig {
                api_url: Some("http://gpu-box:11434/v1".into()),
                ..ProviderConfig::default()
            },
        );
        let router = build_from_config(&config);
        assert_eq!(router.list(), vec!["ollama", "openai"]);
    }
}
