use log::info;
use std::path::Path;

use super::{extract_markdown, ExtractedRecipe};
use crate::error::RecipeDuckError;
use crate::formatter::RecipeFormatter;
use crate::model::ExtractionInput;
use crate::providers::{build_extraction_prompt, LlmProvider};

/// Read a recipe photo and have the vision model transcribe it
pub async fn process(
    path: &Path,
    provider: &dyn LlmProvider,
    formatter: &RecipeFormatter,
) -> Result<ExtractedRecipe, RecipeDuckError> {
    let input = ExtractionInput::from_image_path(path).await?;
    info!("Processing image {}", path.display());

    let prompt = build_extraction_prompt("this recipe image");
    let markdown = extract_markdown(provider, &input, &prompt, formatter).await?;

    Ok(ExtractedRecipe {
        markdown,
        source: path.display().to_string(),
        resolved_url: None,
    })
}
