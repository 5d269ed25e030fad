mod request;
mod text;

pub use request::RequestFetcher;
pub use text::extract_page_text;

use async_trait::async_trait;

use crate::error::RecipeDuckError;

/// Sent with every page request; some recipe sites reject unknown agents.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Status and body of a fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub status: u16,
    pub body: String,
}

impl FetchedPage {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The body, or an [`RecipeDuckError::HttpStatus`] for non-2xx pages
    pub fn into_body(self, url: &str) -> Result<String, RecipeDuckError> {
        if self.is_success() {
            Ok(self.body)
        } else {
            Err(RecipeDuckError::HttpStatus {
                url: url.to_string(),
                status: self.status,
            })
        }
    }
}

/// Fetches raw HTML. A non-2xx answer is a page, not an error.
#[async_trait]
pub trait HtmlFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, RecipeDuckError>;
}
