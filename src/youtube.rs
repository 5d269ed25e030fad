//! Recipes from YouTube video descriptions.
//!
//! Video metadata comes from the YouTube Data API v3 when a key is available,
//! otherwise from the `ytInitialData` blob embedded in the watch page.

use log::{debug, info, warn};
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use serde_json::Value;
use std::sync::LazyLock;
use std::time::Duration;
use url::Url;

use crate::error::RecipeDuckError;
use crate::fetchers::BROWSER_USER_AGENT;

const API_BASE_URL: &str = "https://www.googleapis.com";
const WATCH_BASE_URL: &str = "https://www.youtube.com";

static INITIAL_DATA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)var ytInitialData = (\{.*?\});</script>").expect("valid ytInitialData regex")
});

static META_DESCRIPTION: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"meta[name="description"]"#).expect("valid description selector")
});

static META_TITLE: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"meta[property="og:title"]"#).expect("valid og:title selector")
});

static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("valid title selector"));

/// Whether `url` points at a YouTube video host
pub fn is_youtube_url(url: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|url| url.host_str().map(str::to_ascii_lowercase))
        .is_some_and(|host| {
            matches!(
                host.as_str(),
                "youtube.com" | "www.youtube.com" | "m.youtube.com" | "youtu.be"
            )
        })
}

/// Video id of a watch, embed, `/v/` or short link
pub fn video_id(url: &str) -> Option<String> {
    let url = Url::parse(url).ok()?;
    let host = url.host_str()?.to_ascii_lowercase();
    let path = url.path();

    let id = if host == "youtu.be" {
        path.trim_matches('/').to_string()
    } else if host.ends_with("youtube.com") {
        if path.starts_with("/watch") {
            url.query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned())?
        } else if let Some(rest) = path
            .strip_prefix("/embed/")
            .or_else(|| path.strip_prefix("/v/"))
        {
            rest.trim_matches('/').to_string()
        } else {
            return None;
        }
    } else {
        return None;
    };

    (!id.is_empty()).then_some(id)
}

/// Title, channel and description of a video
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoInfo {
    pub video_id: String,
    pub title: String,
    pub channel: String,
    pub description: String,
}

impl VideoInfo {
    pub fn watch_url(&self) -> String {
        format!("{}/watch?v={}", WATCH_BASE_URL, self.video_id)
    }

    /// Text handed to the extraction model
    pub fn to_prompt_text(&self) -> String {
        format!(
            "Video title: {}\nChannel: {}\n\nVideo description:\n{}",
            self.title, self.channel, self.description
        )
    }
}

pub struct YouTubeClient {
    client: Client,
    api_key: Option<String>,
    api_base_url: String,
    watch_base_url: String,
}

impl YouTubeClient {
    /// `api_key` falls back to the `YOUTUBE_API_KEY` environment variable
    pub fn new(api_key: Option<String>, timeout: Option<Duration>) -> Result<Self, RecipeDuckError> {
        let client = Client::builder()
            .timeout(timeout.unwrap_or(Duration::from_secs(10)))
            .user_agent(BROWSER_USER_AGENT)
            .build()?;

        Ok(YouTubeClient {
            client,
            api_key: api_key.or_else(|| std::env::var("YOUTUBE_API_KEY").ok()),
            api_base_url: API_BASE_URL.to_string(),
            watch_base_url: WATCH_BASE_URL.to_string(),
        })
    }

    #[doc(hidden)]
    pub fn with_base_urls(
        api_key: Option<String>,
        api_base_url: String,
        watch_base_url: String,
    ) -> Self {
        YouTubeClient {
            client: Client::new(),
            api_key,
            api_base_url,
            watch_base_url,
        }
    }

    /// Fetch metadata for the video at `url`.
    ///
    /// An API failure falls back to scraping the watch page.
    pub async fn fetch_video_info(&self, url: &str) -> Result<VideoInfo, RecipeDuckError> {
        let video_id = video_id(url).ok_or_else(|| {
            RecipeDuckError::YouTubeError(format!("Could not extract video ID from {}", url))
        })?;
        debug!("YouTube video ID: {}", video_id);

        if let Some(api_key) = &self.api_key {
            match self.fetch_via_api(&video_id, api_key).await {
                Ok(info) => return Ok(info),
                Err(e) => warn!("YouTube API fetch failed: {}, falling back to web scraping", e),
            }
        }

        self.fetch_via_web(&video_id).await
    }

    async fn fetch_via_api(
        &self,
        video_id: &str,
        api_key: &str,
    ) -> Result<VideoInfo, RecipeDuckError> {
        let response = self
            .client
            .get(format!("{}/youtube/v3/videos", self.api_base_url))
            .query(&[("part", "snippet"), ("id", video_id), ("key", api_key)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RecipeDuckError::YouTubeError(format!(
                "YouTube API returned HTTP {}",
                status.as_u16()
            )));
        }

        let body: Value = response.json().await?;
        let snippet = &body["items"][0]["snippet"];
        if snippet.is_null() {
            return Err(RecipeDuckError::YouTubeError(format!(
                "Video not found: {}",
                video_id
            )));
        }

        let info = VideoInfo {
            video_id: video_id.to_string(),
            title: snippet["title"].as_str().unwrap_or("Unknown Title").to_string(),
            channel: snippet["channelTitle"]
                .as_str()
                .unwrap_or("Unknown Channel")
                .to_string(),
            description: snippet["description"].as_str().unwrap_or_default().to_string(),
        };
        info!(
            "YouTube API: '{}' by {} ({} characters of description)",
            info.title,
            info.channel,
            info.description.len()
        );
        Ok(info)
    }

    async fn fetch_via_web(&self, video_id: &str) -> Result<VideoInfo, RecipeDuckError> {
        let watch_url = format!("{}/watch?v={}", self.watch_base_url, video_id);
        let response = self.client.get(&watch_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RecipeDuckError::HttpStatus {
                url: watch_url,
                status: status.as_u16(),
            });
        }

        let html = response.text().await?;
        let info = parse_watch_page(video_id, &html)?;
        info!(
            "YouTube page: '{}' by {} ({} characters of description)",
            info.title,
            info.channel,
            info.description.len()
        );
        Ok(info)
    }
}

/// Pull video metadata out of a watch page
pub(crate) fn parse_watch_page(video_id: &str, html: &str) -> Result<VideoInfo, RecipeDuckError> {
    let mut title = None;
    let mut channel = None;
    let mut description = None;

    if let Some(captures) = INITIAL_DATA.captures(html) {
        match serde_json::from_str::<Value>(&captures[1]) {
            Ok(data) => {
                let contents = data["contents"]["twoColumnWatchNextResults"]["results"]["results"]
                    ["contents"]
                    .as_array()
                    .cloned()
                    .unwrap_or_default();

                for item in &contents {
                    let primary = &item["videoPrimaryInfoRenderer"];
                    if let Some(text) = primary["title"]["runs"][0]["text"].as_str() {
                        title = Some(text.to_string());
                    }

                    let secondary = &item["videoSecondaryInfoRenderer"];
                    if let Some(text) =
                        secondary["owner"]["videoOwnerRenderer"]["title"]["runs"][0]["text"].as_str()
                    {
                        channel = Some(text.to_string());
                    }
                    if let Some(text) = secondary["attributedDescription"]["content"].as_str() {
                        description = Some(text.to_string());
                    }
                }
            }
            Err(e) => debug!("Failed to parse ytInitialData: {}", e),
        }
    }

    if description.as_deref().map_or(true, str::is_empty) {
        let document = Html::parse_document(html);
        description = meta_content(&document, &META_DESCRIPTION);

        if title.is_none() {
            title = meta_content(&document, &META_TITLE).or_else(|| {
                document.select(&TITLE).next().map(|element| {
                    element
                        .text()
                        .collect::<String>()
                        .replace(" - YouTube", "")
                        .trim()
                        .to_string()
                })
            });
        }
    }

    let description = description.filter(|d| !d.trim().is_empty()).ok_or_else(|| {
        RecipeDuckError::YouTubeError(
            "Could not extract video description from YouTube page. \
             Consider setting YOUTUBE_API_KEY for more reliable access."
                .to_string(),
        )
    })?;

    Ok(VideoInfo {
        video_id: video_id.to_string(),
        title: title.unwrap_or_else(|| "Unknown Title".to_string()),
        channel: channel.unwrap_or_else(|| "Unknown Channel".to_string()),
        description,
    })
}

fn meta_content(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .and_then(|element| element.value().attr("content"))
        .filter(|content| !content.trim().is_empty())
        .map(str::to_string)
}
