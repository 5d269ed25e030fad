use std::path::Path;

use crate::error::RecipeDuckError;

/// What an extraction model is shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionInput {
    /// A photo or scan of a recipe
    Image { data: Vec<u8>, media_type: String },
    /// Cleaned page text, a video description or pasted text
    Text(String),
}

impl ExtractionInput {
    /// Read an image from disk, guessing its media type from the extension.
    pub async fn from_image_path(path: &Path) -> Result<Self, RecipeDuckError> {
        let data = tokio::fs::read(path).await?;
        if data.is_empty() {
            return Err(RecipeDuckError::InvalidInput(format!(
                "image {} is empty",
                path.display()
            )));
        }

        Ok(ExtractionInput::Image {
            data,
            media_type: media_type_for_path(path).to_string(),
        })
    }

    pub fn text(text: impl Into<String>) -> Result<Self, RecipeDuckError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(RecipeDuckError::InvalidInput(
                "no recipe text to extract from".to_string(),
            ));
        }
        Ok(ExtractionInput::Text(text))
    }
}

/// Media type of an image file, `image/jpeg` when the extension is unknown
pub fn media_type_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}
