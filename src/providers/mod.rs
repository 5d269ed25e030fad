mod anthropic;
mod factory;
mod fallback;
mod open_ai;
mod prompt;

pub use anthropic::AnthropicProvider;
pub use factory::ProviderFactory;
pub use fallback::FallbackProvider;
pub use open_ai::OpenAIProvider;
pub use prompt::{build_extraction_prompt, build_print_detection_prompt, RECIPE_TEMPLATE};

use async_trait::async_trait;
use reqwest::Response;

use crate::error::RecipeDuckError;
use crate::model::ExtractionInput;

/// Unified trait for all LLM providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name (e.g., "openai", "anthropic")
    fn provider_name(&self) -> &str;

    /// Send `input` with `prompt` to the model and return its text answer
    async fn extract(&self, input: &ExtractionInput, prompt: &str)
        -> Result<String, RecipeDuckError>;
}

/// Turn a non-success API response into a provider error carrying its body
pub(crate) async fn check_response(
    provider: &str,
    response: Response,
) -> Result<Response, RecipeDuckError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(RecipeDuckError::ProviderError(format!(
        "{} returned HTTP {}: {}",
        provider,
        status.as_u16(),
        body.trim()
    )))
}
