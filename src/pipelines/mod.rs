pub mod image;
pub mod text;
pub mod url;
pub mod youtube;

use log::debug;

use crate::error::RecipeDuckError;
use crate::formatter::RecipeFormatter;
use crate::model::ExtractionInput;
use crate::print_url::ResolvedUrl;
use crate::providers::LlmProvider;

/// A recipe produced by one of the pipelines
#[derive(Debug, Clone)]
pub struct ExtractedRecipe {
    /// Formatted markdown recipe
    pub markdown: String,
    /// Image path, page URL, video URL or "direct-input"
    pub source: String,
    /// How the fetched page was chosen, for web pages only
    pub resolved_url: Option<ResolvedUrl>,
}

/// Ask the model for a markdown recipe, then run it through the formatter
pub(crate) async fn extract_markdown(
    provider: &dyn LlmProvider,
    input: &ExtractionInput,
    prompt: &str,
    formatter: &RecipeFormatter,
) -> Result<String, RecipeDuckError> {
    let raw = provider.extract(input, prompt).await?;
    debug!(
        "{} returned {} characters of markdown",
        provider.provider_name(),
        raw.len()
    );

    if raw.trim().is_empty() {
        return Err(RecipeDuckError::ProviderError(format!(
            "{} returned an empty recipe",
            provider.provider_name()
        )));
    }

    Ok(formatter.format(&raw))
}
