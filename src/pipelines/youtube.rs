use log::info;

use super::{extract_markdown, ExtractedRecipe};
use crate::error::RecipeDuckError;
use crate::formatter::RecipeFormatter;
use crate::model::ExtractionInput;
use crate::providers::{build_extraction_prompt, LlmProvider};
use crate::youtube::YouTubeClient;

/// Extract the recipe written in a video's description
pub async fn process(
    url: &str,
    client: &YouTubeClient,
    provider: &dyn LlmProvider,
    formatter: &RecipeFormatter,
) -> Result<ExtractedRecipe, RecipeDuckError> {
    let video = client.fetch_video_info(url).await?;
    info!("Extracting recipe from video '{}'", video.title);

    let input = ExtractionInput::text(video.to_prompt_text())?;
    let prompt = build_extraction_prompt("the YouTube video description below");
    let markdown = extract_markdown(provider, &input, &prompt, formatter).await?;

    Ok(ExtractedRecipe {
        markdown,
        source: video.watch_url(),
        resolved_url: None,
    })
}
