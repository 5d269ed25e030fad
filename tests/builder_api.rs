use async_trait::async_trait;
use mockito::Server;
use recipe_duck::{
    AppConfig, ExtractionInput, LlmProvider, RecipeDuckError, RecipeImporter, ResolutionMethod,
};
use std::sync::{Arc, Mutex};

const REPLY: &str = "# Lentil Soup\n\n**Servings:** 4\n\n## Ingredients\n\n* 2 tbsp olive oil\n* 1½ c red lentils\n\n## Instructions\n\n1. Warm the oil.\n1. Add the lentils.";

/// Records the page text it was asked about and answers with `REPLY`
#[derive(Default)]
struct RecordingProvider {
    texts: Mutex<Vec<String>>,
}

#[async_trait]
impl LlmProvider for RecordingProvider {
    fn provider_name(&self) -> &str {
        "recording"
    }

    async fn extract(
        &self,
        input: &ExtractionInput,
        _prompt: &str,
    ) -> Result<String, RecipeDuckError> {
        if let ExtractionInput::Text(text) = input {
            self.texts.lock().unwrap().push(text.clone());
        }
        Ok(REPLY.to_string())
    }
}

fn print_page() -> String {
    format!(
        "<html><body><main>Lentil soup, printable</main><!-- {} --></body></html>",
        "x".repeat(2048)
    )
}

#[tokio::test]
async fn test_url_import_reads_print_page() {
    let mut server = Server::new_async().await;
    server
        .mock("HEAD", "/recipes/lentil-soup/print/")
        .with_status(200)
        .create_async()
        .await;
    let print = server
        .mock("GET", "/recipes/lentil-soup/print/")
        .with_status(200)
        .with_body(print_page())
        .expect_at_least(1)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let cache_path = dir.path().join("print-domains.json");

    let mut config = AppConfig::default();
    config.print_url.llm_detection = false;
    config.print_url.cache_path = Some(cache_path.clone());

    let provider = Arc::new(RecordingProvider::default());
    let url = format!("{}/recipes/lentil-soup", server.url());
    let recipe = RecipeImporter::builder()
        .config(config)
        .custom_provider(provider.clone())
        .url(&url)
        .build()
        .await
        .unwrap();

    assert_eq!(recipe.source, url);
    let resolved = recipe.resolved_url.unwrap();
    assert_eq!(resolved.method, ResolutionMethod::Pattern);
    assert_eq!(resolved.url, format!("{}/print/", url));

    assert_eq!(
        provider.texts.lock().unwrap().as_slice(),
        ["Lentil soup, printable".to_string()]
    );
    assert_eq!(
        recipe.markdown,
        "# Lentil Soup\n\n**Servings:** 4\n\n## Ingredients\n\n- 2 tablespoons olive oil\n- 1 1/2 cups red lentils\n\n## Instructions\n\n1. Warm the oil.\n2. Add the lentils."
    );

    let stored = std::fs::read_to_string(&cache_path).unwrap();
    assert!(stored.contains("suffix_print_slash"));
    print.assert_async().await;
}

#[tokio::test]
async fn test_url_import_without_print_version() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/recipes/lentil-soup")
        .with_status(200)
        .with_body("<html><body><nav>Home</nav><article>Lentil soup</article></body></html>")
        .create_async()
        .await;

    let mut config = AppConfig::default();
    config.print_url.llm_detection = false;

    let provider = Arc::new(RecordingProvider::default());
    let url = format!("{}/recipes/lentil-soup", server.url());
    let recipe = RecipeImporter::builder()
        .config(config)
        .custom_provider(provider.clone())
        .url(&url)
        .no_format()
        .build()
        .await
        .unwrap();

    let resolved = recipe.resolved_url.unwrap();
    assert_eq!(resolved.method, ResolutionMethod::Original);
    assert_eq!(resolved.url, url);
    assert_eq!(recipe.markdown, REPLY);
    assert_eq!(
        provider.texts.lock().unwrap().as_slice(),
        ["Lentil soup".to_string()]
    );
}

#[tokio::test]
async fn test_text_import_skipping_extraction() {
    let provider = Arc::new(RecordingProvider::default());
    let recipe = RecipeImporter::builder()
        .config(AppConfig::default())
        .custom_provider(provider.clone())
        .text("## Ingredients\n* 3 T sugar\n\n## Method\nStep 1: Stir.")
        .skip_extraction()
        .build()
        .await
        .unwrap();

    assert_eq!(
        recipe.markdown,
        "## Ingredients\n- 3 tablespoons sugar\n\n## Method\n1. Stir."
    );
    assert!(provider.texts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_image_is_reported() {
    let result = RecipeImporter::builder()
        .config(AppConfig::default())
        .custom_provider(Arc::new(RecordingProvider::default()))
        .image("/definitely/not/here.jpg")
        .build()
        .await;

    assert!(matches!(result, Err(RecipeDuckError::Io(_))));
}

#[tokio::test]
async fn test_unsupported_scheme() {
    let result = RecipeImporter::builder()
        .config(AppConfig::default())
        .custom_provider(Arc::new(RecordingProvider::default()))
        .url("ftp://example.com/recipe")
        .build()
        .await;

    assert!(matches!(result, Err(RecipeDuckError::InvalidInput(_))));
}

// Live tests, run with `cargo test -- --ignored` and an API key in the environment
#[tokio::test]
#[ignore]
async fn test_live_url_import() {
    let recipe = RecipeImporter::builder()
        .url("https://www.allrecipes.com/recipe/10813/best-chocolate-chip-cookies/")
        .build()
        .await
        .unwrap();

    assert!(recipe.markdown.contains("## Ingredients"));
    assert!(recipe.resolved_url.is_some());
}

#[tokio::test]
#[ignore]
async fn test_live_youtube_import() {
    let recipe = RecipeImporter::builder()
        .url("https://www.youtube.com/watch?v=dQw4w9WgXcQ")
        .build()
        .await;

    assert!(recipe.is_ok() || matches!(recipe, Err(RecipeDuckError::ProviderError(_))));
}
