// src/feed/refresher.rs
//! Keeps the persisted review store in step with the remote feed.
//!
//! Refreshes are pulled, never scheduled: each read checks how long ago the
//! last refresh started and refetches when that exceeds `STALENESS_THRESHOLD`.

use crate::error::Result;
use crate::feed::parser::parse_feed;
use crate::feed::FeedSource;
use crate::store::{Review, ReviewStore};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

pub const STALENESS_THRESHOLD: Duration = Duration::from_secs(300);

/// Snapshot of the refresher readable without taking the refresher's lock,
/// so status reads never queue behind an in-flight fetch.
#[derive(Debug, Default)]
pub struct RefreshStatus {
    reviews: AtomicUsize,
    last_refreshed_at: RwLock<Option<Instant>>,
}

impl RefreshStatus {
    pub fn reviews(&self) -> usize {
        self.reviews.load(Ordering::Relaxed)
    }

    pub fn last_refreshed_at(&self) -> Option<Instant> {
        match self.last_refreshed_at.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn set_reviews(&self, count: usize) {
        self.reviews.store(count, Ordering::Relaxed);
    }

    fn set_last_refreshed_at(&self, at: Instant) {
        match self.last_refreshed_at.write() {
            Ok(mut guard) => *guard = Some(at),
            Err(poisoned) => *poisoned.into_inner() = Some(at),
        }
    }
}

pub struct FeedRefresher {
    owner_handle: String,
    storage_path: PathBuf,
    source: Box<dyn FeedSource>,
    store: ReviewStore,
    last_refreshed_at: Option<Instant>,
    status: Arc<RefreshStatus>,
}

impl FeedRefresher {
    /// Loads the persisted reviews, merges one immediate fetch and persists.
    ///
    /// Any failure here is meant to abort startup; nothing is retried.
    pub async fn initialize(
        owner_handle: impl Into<String>,
        storage_path: impl Into<PathBuf>,
        source: Box<dyn FeedSource>,
    ) -> Result<Self> {
        let storage_path = storage_path.into();
        let store = ReviewStore::load(&storage_path)?;

        let mut refresher = Self {
            owner_handle: owner_handle.into(),
            storage_path,
            source,
            store,
            last_refreshed_at: None,
            status: Arc::new(RefreshStatus::default()),
        };
        refresher.status.set_reviews(refresher.store.len());
        info!(
            "Initializing review feed for '{}' from {}",
            refresher.owner_handle,
            refresher.source.url()
        );
        refresher.update().await?;
        refresher.mark_refreshed(Instant::now());
        Ok(refresher)
    }

    pub fn is_stale(&self) -> bool {
        match self.last_refreshed_at {
            None => true,
            Some(at) => at.elapsed() > STALENESS_THRESHOLD,
        }
    }

    /// Refetches and persists when the data is stale. Returns whether a fetch ran.
    ///
    /// The timestamp moves before the fetch, so a failed fetch is not retried
    /// until another full threshold has passed.
    pub async fn refresh_if_stale(&mut self) -> Result<bool> {
        if !self.is_stale() {
            debug!("Review data is fresh, skipping refresh");
            return Ok(false);
        }
        info!("Review data is stale, refreshing feed for '{}'", self.owner_handle);
        self.mark_refreshed(Instant::now());
        self.update().await?;
        Ok(true)
    }

    fn mark_refreshed(&mut self, at: Instant) {
        self.last_refreshed_at = Some(at);
        self.status.set_last_refreshed_at(at);
    }

    /// Fetch, merge and persist.
    pub async fn update(&mut self) -> Result<usize> {
        let added = self.fetch_and_merge().await?;
        self.store.save(&self.storage_path)?;
        Ok(added)
    }

    /// Merges review entries from the feed that the store does not hold yet.
    /// Returns how many were appended.
    ///
    /// Every review entry is converted before any is appended, so a single
    /// malformed entry leaves the store untouched.
    pub async fn fetch_and_merge(&mut self) -> Result<usize> {
        let document = self.source.fetch().await?;
        let entries = parse_feed(&document)?;

        let mut candidates = Vec::with_capacity(entries.len());
        let mut skipped = 0usize;
        for entry in &entries {
            if !entry.is_review() {
                skipped += 1;
                continue;
            }
            candidates.push(entry.to_review()?);
        }

        let mut added = 0usize;
        for candidate in candidates {
            if self.store.push_if_new(candidate) {
                added += 1;
            }
        }
        self.status.set_reviews(self.store.len());

        if skipped > 0 {
            debug!("Skipped {} non-review feed entries", skipped);
        }
        info!(
            "Merged {} new reviews from {} feed entries ({} total)",
            added,
            entries.len(),
            self.store.len()
        );
        Ok(added)
    }

    /// Formatted random review, refreshing first when stale.
    pub async fn get_random_review(&mut self) -> Result<String> {
        self.refresh_if_stale().await?;
        match self.store.random_pick() {
            Ok(review) => Ok(review.to_string()),
            Err(e) => {
                warn!("Random review requested for '{}': {}", self.owner_handle, e);
                Err(e)
            }
        }
    }

    /// Exact title lookup, refreshing first when stale.
    pub async fn get_review_from_title(&mut self, title: &str) -> Result<Option<Review>> {
        self.refresh_if_stale().await?;
        Ok(self.store.find_by_title(title).cloned())
    }

    /// Formatted reviews longer than `min_len` characters, in store order.
    pub fn long_reviews(&self, min_len: usize) -> Vec<String> {
        self.store
            .reviews()
            .iter()
            .map(Review::to_string)
            .filter(|formatted| formatted.chars().count() > min_len)
            .collect()
    }

    pub fn reviews(&self) -> &[Review] {
        self.store.reviews()
    }

    pub fn owner_handle(&self) -> &str {
        &self.owner_handle
    }

    /// Shared handle on the review count and last refresh time.
    pub fn status(&self) -> Arc<RefreshStatus> {
        Arc::clone(&self.status)
    }

    #[cfg(test)]
    pub(crate) fn force_stale(&mut self) {
        self.last_refreshed_at = None;
    }
}
