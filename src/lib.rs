//! Recipes from photos, web pages and YouTube videos as canonical markdown.
//!
//! An AI model transcribes the recipe; [`RecipeFormatter`] then rewrites its
//! output deterministically. For web pages, [`PrintUrlResolver`] first looks
//! for the print-friendly version of the page.

pub mod builder;
pub mod config;
pub mod error;
pub mod fetchers;
pub mod formatter;
pub mod model;
pub mod pipelines;
pub mod print_url;
pub mod providers;
pub mod youtube;

pub use builder::{InputSource, ProviderKind, RecipeImporter, RecipeImporterBuilder};
pub use config::{AppConfig, FallbackConfig, FormattingConfig, PrintUrlConfig, ProviderConfig};
pub use error::RecipeDuckError;
pub use formatter::RecipeFormatter;
pub use model::ExtractionInput;
pub use pipelines::ExtractedRecipe;
pub use print_url::{
    DomainCache, InMemoryDomainCache, JsonFileDomainCache, PrintPattern, PrintStrategy,
    PrintUrlResolver, ResolutionMethod, ResolvedUrl, UrlChecker,
};
pub use providers::LlmProvider;
