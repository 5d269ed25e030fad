use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use std::time::Duration;

use super::{FetchedPage, HtmlFetcher, BROWSER_USER_AGENT};
use crate::error::RecipeDuckError;

pub struct RequestFetcher {
    client: Client,
}

impl RequestFetcher {
    pub fn new(timeout: Option<Duration>) -> Result<Self, RecipeDuckError> {
        let timeout = timeout.unwrap_or(Duration::from_secs(30));
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(BROWSER_USER_AGENT)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HtmlFetcher for RequestFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, RecipeDuckError> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!("Fetched {} ({}, {} bytes)", url, status, body.len());
        Ok(FetchedPage { status, body })
    }
}
