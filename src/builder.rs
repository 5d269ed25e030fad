use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{AppConfig, FormattingConfig};
use crate::error::RecipeDuckError;
use crate::fetchers::{HtmlFetcher, RequestFetcher};
use crate::formatter::RecipeFormatter;
use crate::pipelines::{self, ExtractedRecipe};
use crate::print_url::{
    DomainCache, HttpChecker, InMemoryDomainCache, JsonFileDomainCache, PrintUrlResolver,
};
use crate::providers::{FallbackProvider, LlmProvider, ProviderFactory};
use crate::youtube::{self, YouTubeClient};

/// Represents the input source for a recipe
#[derive(Debug, Clone)]
pub enum InputSource {
    /// Recipe web page or YouTube video
    Url(String),
    /// Plain text or markdown recipe
    Text(String),
    /// Photo or scan of a recipe
    Image(PathBuf),
}

/// AI provider used for extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAI,
    Anthropic,
}

impl ProviderKind {
    /// Convert to provider name string used by the factory
    fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "openai",
            ProviderKind::Anthropic => "anthropic",
        }
    }
}

/// Builder for configuring and executing recipe imports
pub struct RecipeImporterBuilder {
    source: Option<InputSource>,
    config: Option<AppConfig>,
    provider: Option<ProviderKind>,
    custom_provider: Option<Arc<dyn LlmProvider>>,
    timeout: Option<Duration>,
    api_key: Option<String>,
    model: Option<String>,
    format: bool,
    print_url: bool,
    extract: bool,
}

impl Default for RecipeImporterBuilder {
    fn default() -> Self {
        RecipeImporterBuilder {
            source: None,
            config: None,
            provider: None,
            custom_provider: None,
            timeout: None,
            api_key: None,
            model: None,
            format: true,
            print_url: true,
            extract: true,
        }
    }
}

impl RecipeImporterBuilder {
    /// Set the input source to a URL
    ///
    /// YouTube links are read from the video description, other pages are
    /// fetched (print version first) and read by the model.
    ///
    /// # Example
    /// ```
    /// use recipe_duck::RecipeImporter;
    ///
    /// let builder = RecipeImporter::builder()
    ///     .url("https://example.com/recipe");
    /// ```
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.source = Some(InputSource::Url(url.into()));
        self
    }

    /// Set the input source to plain text
    ///
    /// # Example
    /// ```
    /// use recipe_duck::RecipeImporter;
    ///
    /// let builder = RecipeImporter::builder()
    ///     .text("Take 2 eggs and 1 cup of flour. Mix them together and bake at 350F for 30 minutes.");
    /// ```
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.source = Some(InputSource::Text(text.into()));
        self
    }

    /// Set the input source to an image file
    pub fn image(mut self, image_path: impl Into<PathBuf>) -> Self {
        self.source = Some(InputSource::Image(image_path.into()));
        self
    }

    /// Treat text input as a finished markdown recipe and only format it
    pub fn skip_extraction(mut self) -> Self {
        self.extract = false;
        self
    }

    /// Use this configuration instead of loading `recipe-duck.toml` and the environment
    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the AI provider, disabling the fallback chain
    ///
    /// # Example
    /// ```
    /// use recipe_duck::{ProviderKind, RecipeImporter};
    ///
    /// let builder = RecipeImporter::builder()
    ///     .url("https://example.com/recipe")
    ///     .provider(ProviderKind::Anthropic);
    /// ```
    pub fn provider(mut self, provider: ProviderKind) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Use a caller-supplied model client for extraction and print detection
    pub fn custom_provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.custom_provider = Some(provider);
        self
    }

    /// Set a timeout for page and video requests
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Set the API key for the selected provider
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the model name for the selected provider
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Return the model's markdown without deterministic formatting
    pub fn no_format(mut self) -> Self {
        self.format = false;
        self
    }

    /// Fetch the page as given instead of searching for a print version
    pub fn no_print_url(mut self) -> Self {
        self.print_url = false;
        self
    }

    /// Build and execute the recipe import operation
    ///
    /// # Errors
    /// Returns `RecipeDuckError` if:
    /// - No input source was specified
    /// - The configuration is invalid
    /// - The image, page or video cannot be read
    /// - Every provider fails
    ///
    /// # Example
    /// ```no_run
    /// # use recipe_duck::RecipeImporter;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let recipe = RecipeImporter::builder()
    ///     .url("https://example.com/recipe")
    ///     .build()
    ///     .await?;
    /// println!("{}", recipe.markdown);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn build(self) -> Result<ExtractedRecipe, RecipeDuckError> {
        let source = self.source.clone().ok_or_else(|| {
            RecipeDuckError::BuilderError(
                "No input source specified. Use .url(), .text() or .image()".to_string(),
            )
        })?;

        let config = self.resolve_config()?;
        let formatter = RecipeFormatter::new(config.formatting.clone())?;
        let timeout = Duration::from_secs(config.timeout);

        let provider: Arc<dyn LlmProvider> = match &self.custom_provider {
            Some(provider) => provider.clone(),
            None => Arc::new(FallbackProvider::new(&config)?),
        };

        match source {
            InputSource::Url(url) if youtube::is_youtube_url(&url) => {
                let client = YouTubeClient::new(None, Some(timeout))?;
                pipelines::youtube::process(&url, &client, provider.as_ref(), &formatter).await
            }
            InputSource::Url(url) => {
                let fetcher: Arc<dyn HtmlFetcher> = Arc::new(RequestFetcher::new(Some(timeout))?);
                let resolver = print_url_resolver(
                    &config,
                    fetcher.clone(),
                    self.custom_provider.clone(),
                )
                .await?;
                pipelines::url::process(
                    &url,
                    &resolver,
                    fetcher.as_ref(),
                    provider.as_ref(),
                    &formatter,
                )
                .await
            }
            InputSource::Text(text) => {
                pipelines::text::process(&text, self.extract, provider.as_ref(), &formatter).await
            }
            InputSource::Image(path) => {
                pipelines::image::process(&path, provider.as_ref(), &formatter).await
            }
        }
    }

    /// Loaded or supplied configuration with the builder's overrides applied
    fn resolve_config(&self) -> Result<AppConfig, RecipeDuckError> {
        let mut config = match &self.config {
            Some(config) => config.clone(),
            None => AppConfig::load()?,
        };

        if !self.format {
            config.formatting = FormattingConfig::disabled();
        }
        if !self.print_url {
            config.print_url.enabled = false;
        }
        if let Some(timeout) = self.timeout {
            config.timeout = timeout.as_secs().max(1);
        }

        if self.provider.is_some() || self.api_key.is_some() || self.model.is_some() {
            let name = self
                .provider
                .map(|p| p.as_str().to_string())
                .unwrap_or_else(|| config.default_provider.clone());
            let mut provider_config = config.provider_config(&name).ok_or_else(|| {
                RecipeDuckError::BuilderError(format!("Unknown provider: {}", name))
            })?;
            if let Some(key) = &self.api_key {
                provider_config.api_key = Some(key.clone());
            }
            if let Some(model) = &self.model {
                provider_config.model = model.clone();
            }
            provider_config.enabled = true;

            config.providers.insert(name.clone(), provider_config);
            config.default_provider = name;
            config.fallback.enabled = false;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Resolver for `config`, with model-based detection when it is configured
/// and a detection provider can be built
async fn print_url_resolver(
    config: &AppConfig,
    fetcher: Arc<dyn HtmlFetcher>,
    custom_provider: Option<Arc<dyn LlmProvider>>,
) -> Result<PrintUrlResolver, RecipeDuckError> {
    let settings = config.print_url.clone();
    let checker = HttpChecker::new(&settings)?;

    let cache: Arc<dyn DomainCache> = match &settings.cache_path {
        Some(path) => Arc::new(JsonFileDomainCache::open(path).await?),
        None => Arc::new(InMemoryDomainCache::new()),
    };

    let llm_detection = settings.enabled && settings.llm_detection;
    let resolver = PrintUrlResolver::new(settings, Arc::new(checker), cache)?;
    if !llm_detection {
        return Ok(resolver);
    }

    let detection = match custom_provider {
        Some(provider) => Ok(provider),
        None => ProviderFactory::detection_provider(config).map(Arc::from),
    };
    match detection {
        Ok(provider) => {
            info!("Print URL detection uses {}", provider.provider_name());
            Ok(resolver.with_llm_detection(fetcher, provider))
        }
        Err(e) => {
            warn!("Model-based print URL detection unavailable: {}", e);
            Ok(resolver)
        }
    }
}

/// Main entry point for the builder API
pub struct RecipeImporter;

impl RecipeImporter {
    /// Creates a new builder for importing recipes
    ///
    /// # Example
    /// ```
    /// use recipe_duck::RecipeImporter;
    ///
    /// let builder = RecipeImporter::builder();
    /// ```
    pub fn builder() -> RecipeImporterBuilder {
        RecipeImporterBuilder::default()
    }
}
