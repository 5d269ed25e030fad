use thiserror::Error;

/// Errors that can occur while extracting and formatting recipes
#[derive(Error, Debug)]
pub enum RecipeDuckError {
    /// Failed to fetch a page or talk to an API
    #[error("Failed to fetch URL: {0}")]
    FetchError(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("{url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    /// The URL could not be parsed
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The AI extraction service failed or returned an unusable response
    #[error("Provider error: {0}")]
    ProviderError(String),

    /// A configuration value failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),

    /// Input could not be used (empty text, unreadable image, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// YouTube metadata could not be extracted
    #[error("YouTube error: {0}")]
    YouTubeError(String),

    /// Builder configuration error
    #[error("Builder error: {0}")]
    BuilderError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
