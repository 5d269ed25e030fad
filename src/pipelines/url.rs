use log::{info, warn};
use url::Url;

use super::{extract_markdown, ExtractedRecipe};
use crate::error::RecipeDuckError;
use crate::fetchers::{extract_page_text, HtmlFetcher};
use crate::formatter::RecipeFormatter;
use crate::model::ExtractionInput;
use crate::print_url::{PrintUrlResolver, ResolutionMethod, ResolvedUrl};
use crate::providers::{build_extraction_prompt, LlmProvider};

/// Process a recipe web page
///
/// This pipeline:
/// 1. Resolves the print-friendly version of the page, if any
/// 2. Fetches it, falling back to the original page when that fails
/// 3. Strips the page down to its readable text
/// 4. Has the model extract the recipe and formats the result
pub async fn process(
    url: &str,
    resolver: &PrintUrlResolver,
    fetcher: &dyn HtmlFetcher,
    provider: &dyn LlmProvider,
    formatter: &RecipeFormatter,
) -> Result<ExtractedRecipe, RecipeDuckError> {
    let parsed = Url::parse(url)?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(RecipeDuckError::InvalidInput(format!(
            "unsupported URL scheme: {}",
            parsed.scheme()
        )));
    }

    let resolved = resolver.resolve(url).await;
    info!(
        "Fetching {} (via {}, resolved in {:?})",
        resolved.url, resolved.method, resolved.elapsed
    );

    let html = fetch_html(fetcher, &resolved, url).await?;
    let text = extract_page_text(&html);
    let input = ExtractionInput::text(text)
        .map_err(|_| RecipeDuckError::InvalidInput(format!("no readable text on {}", url)))?;

    let prompt = build_extraction_prompt("the recipe web page text below");
    let markdown = extract_markdown(provider, &input, &prompt, formatter).await?;

    Ok(ExtractedRecipe {
        markdown,
        source: url.to_string(),
        resolved_url: Some(resolved),
    })
}

async fn fetch_html(
    fetcher: &dyn HtmlFetcher,
    resolved: &ResolvedUrl,
    original: &str,
) -> Result<String, RecipeDuckError> {
    let attempt = fetcher
        .fetch(&resolved.url)
        .await
        .and_then(|page| page.into_body(&resolved.url));

    match attempt {
        Ok(html) => Ok(html),
        Err(e) if resolved.method != ResolutionMethod::Original => {
            warn!(
                "Failed to fetch print page {}: {}, using original page",
                resolved.url, e
            );
            fetcher.fetch(original).await?.into_body(original)
        }
        Err(e) => Err(e),
    }
}
