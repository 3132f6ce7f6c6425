// src/feed/mod.rs
//! Remote review feed: transport, entry parsing and the cache refresher.

pub mod parser;
pub mod refresher;

pub use parser::{extract_body, is_review_guid, parse_feed, FeedEntry};
pub use refresher::{FeedRefresher, RefreshStatus, STALENESS_THRESHOLD};

use crate::error::{ReviewError, Result};
use async_trait::async_trait;
use log::{debug, info};

/// Anything that can hand back the raw feed document.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Location the document is fetched from, for logging.
    fn url(&self) -> &str;

    async fn fetch(&self) -> Result<String>;
}

/// Builds `<feed_host>/<owner_handle>/rss`.
pub fn feed_url(feed_host: &str, owner_handle: &str) -> String {
    format!("{}/{}/rss", feed_host.trim_end_matches('/'), owner_handle)
}

/// Fetches the feed over HTTP. No timeout is applied; a slow feed blocks
/// the caller.
pub struct HttpFeedSource {
    url: String,
    client: reqwest::Client,
}

impl HttpFeedSource {
    pub fn new(feed_host: &str, owner_handle: &str) -> Self {
        Self {
            url: feed_url(feed_host, owner_handle),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    fn url(&self) -> &str {
        &self.url
    }

    async fn fetch(&self) -> Result<String> {
        info!("Fetching review feed from {}", self.url);
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReviewError::FeedFetchError(format!(
                "{} responded with HTTP {}",
                self.url, status
            )));
        }

        let body = response.text().await?;
        debug!("Received {} bytes from {}", body.len(), self.url);
        Ok(body)
    }
}
