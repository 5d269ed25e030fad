use crate::config::{AppConfig, ProviderConfig};
use crate::error::RecipeDuckError;
use crate::providers::{AnthropicProvider, LlmProvider, OpenAIProvider};
use log::debug;

pub struct ProviderFactory;

impl ProviderFactory {
    /// Create a provider instance from configuration
    pub fn create(
        provider_name: &str,
        config: &ProviderConfig,
    ) -> Result<Box<dyn LlmProvider>, RecipeDuckError> {
        // Validate that provider is enabled
        if !config.enabled {
            return Err(RecipeDuckError::InvalidConfig(format!(
                "Provider '{}' is not enabled in configuration",
                provider_name
            )));
        }

        match provider_name {
            "openai" => Ok(Box::new(OpenAIProvider::new(config)?)),
            "anthropic" => Ok(Box::new(AnthropicProvider::new(config)?)),
            _ => Err(RecipeDuckError::InvalidConfig(format!(
                "Unknown provider: {}",
                provider_name
            ))),
        }
    }

    /// Get the default provider from configuration
    pub fn get_default_provider(config: &AppConfig) -> Result<Box<dyn LlmProvider>, RecipeDuckError> {
        let provider_name = &config.default_provider;
        let provider_config = config.provider_config(provider_name).ok_or_else(|| {
            RecipeDuckError::InvalidConfig(format!(
                "Default provider '{}' not found in configuration",
                provider_name
            ))
        })?;

        Self::create(provider_name, &provider_config)
    }

    /// Provider answering print-link questions, running `print_url.detection_model`.
    ///
    /// The provider is picked from the model name; unrecognised models run on
    /// the default provider. Credentials and base URL come from that
    /// provider's own settings.
    pub fn detection_provider(config: &AppConfig) -> Result<Box<dyn LlmProvider>, RecipeDuckError> {
        let model = config.print_url.detection_model.as_str();
        let provider_name = Self::provider_for_model(model).unwrap_or(&config.default_provider);

        let mut provider_config = config.provider_config(provider_name).ok_or_else(|| {
            RecipeDuckError::InvalidConfig(format!(
                "Provider '{}' for detection model '{}' not found in configuration",
                provider_name, model
            ))
        })?;
        provider_config.model = model.to_string();
        provider_config.temperature = 0.0;
        provider_config.max_tokens = 256;

        debug!("Print detection uses {} ({})", provider_name, model);
        Self::create(provider_name, &provider_config)
    }

    /// Provider serving a model name, if the name says so
    pub fn provider_for_model(model: &str) -> Option<&'static str> {
        let model = model.trim().to_ascii_lowercase();
        if model.starts_with("claude") {
            Some("anthropic")
        } else if ["gpt-", "o1", "o3", "o4"]
            .iter()
            .any(|prefix| model.starts_with(prefix))
        {
            Some("openai")
        } else {
            None
        }
    }

    /// List all available provider names
    pub fn available_providers() -> Vec<&'static str> {
        vec!["openai", "anthropic"]
    }
}
