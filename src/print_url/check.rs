use async_trait::async_trait;
use log::debug;
use reqwest::header::CONTENT_LENGTH;
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tokio::time::sleep;

use crate::config::PrintUrlConfig;
use crate::error::RecipeDuckError;
use crate::fetchers::BROWSER_USER_AGENT;

/// Lightweight existence check for a candidate URL.
///
/// Implementations must not fail: any error means "not usable".
#[async_trait]
pub trait UrlChecker: Send + Sync {
    async fn check(&self, url: &str) -> bool;
}

/// HEAD-then-GET checker with a content size sanity check
pub struct HttpChecker {
    client: Client,
    min_content_length: u64,
    max_content_length: u64,
    retry_delay: Duration,
}

enum Attempt {
    Done(bool),
    Retry,
}

impl HttpChecker {
    pub fn new(config: &PrintUrlConfig) -> Result<Self, RecipeDuckError> {
        let client = Client::builder()
            .timeout(config.check_timeout())
            .user_agent(BROWSER_USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            min_content_length: config.min_content_length,
            max_content_length: config.max_content_length,
            retry_delay: Duration::from_secs(1),
        })
    }

    /// Delay before the single retry on 429/503 or a network error
    #[doc(hidden)]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    async fn attempt(&self, url: &str, retries_left: bool) -> Attempt {
        let response = match self.client.head(url).send().await {
            Ok(response) => response,
            Err(e) if retries_left && (e.is_timeout() || e.is_connect()) => {
                debug!("Check of {} failed ({}), retrying", url, e);
                return Attempt::Retry;
            }
            Err(e) => {
                debug!("Check of {} failed: {}", url, e);
                return Attempt::Done(false);
            }
        };

        let status = response.status();
        if retries_left
            && (status == StatusCode::TOO_MANY_REQUESTS
                || status == StatusCode::SERVICE_UNAVAILABLE)
        {
            debug!("Check of {} got {}, retrying", url, status);
            return Attempt::Retry;
        }
        if status != StatusCode::OK {
            debug!("Check of {} got {}", url, status);
            return Attempt::Done(false);
        }

        let length = match declared_length(&response) {
            Some(length) => length,
            None => match self.body_length(url).await {
                Some(length) => length,
                None => return Attempt::Done(false),
            },
        };

        let usable = self.min_content_length < length && length < self.max_content_length;
        debug!("Check of {}: {} bytes, usable: {}", url, length, usable);
        Attempt::Done(usable)
    }

    async fn body_length(&self, url: &str) -> Option<u64> {
        let response = self.client.get(url).send().await.ok()?;
        if !response.status().is_success() {
            return None;
        }
        let body = response.bytes().await.ok()?;
        Some(body.len() as u64)
    }
}

/// `Content-Length` from the headers; zero counts as missing.
fn declared_length(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|length| *length > 0)
}

#[async_trait]
impl UrlChecker for HttpChecker {
    async fn check(&self, url: &str) -> bool {
        match self.attempt(url, true).await {
            Attempt::Done(usable) => usable,
            Attempt::Retry => {
                sleep(self.retry_delay).await;
                match self.attempt(url, false).await {
                    Attempt::Done(usable) => usable,
                    Attempt::Retry => false,
                }
            }
        }
    }
}
