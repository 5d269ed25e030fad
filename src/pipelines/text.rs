use super::{extract_markdown, ExtractedRecipe};
use crate::error::RecipeDuckError;
use crate::formatter::RecipeFormatter;
use crate::model::ExtractionInput;
use crate::providers::{build_extraction_prompt, LlmProvider};

/// Turn pasted recipe text into a formatted markdown recipe.
///
/// With `extract` unset the text is assumed to already be a markdown recipe
/// and only goes through the formatter.
pub async fn process(
    text: &str,
    extract: bool,
    provider: &dyn LlmProvider,
    formatter: &RecipeFormatter,
) -> Result<ExtractedRecipe, RecipeDuckError> {
    let input = ExtractionInput::text(text)?;

    let markdown = if extract {
        let prompt = build_extraction_prompt("the recipe text below");
        extract_markdown(provider, &input, &prompt, formatter).await?
    } else {
        formatter.format(text)
    };

    Ok(ExtractedRecipe {
        markdown,
        source: "direct-input".to_string(),
        resolved_url: None,
    })
}
