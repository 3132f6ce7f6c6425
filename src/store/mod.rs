// src/store/mod.rs
//! Append-ordered review collection persisted as a headerless 9-column CSV.
//!
//! Column order on disk:
//! `date, name, year, uri, rating, rewatch, review, tags, watched_date`

use crate::error::{ReviewError, Result};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Number of columns every persisted row must carry.
pub const REVIEW_COLUMNS: usize = 9;

/// A single film review entry.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Review {
    pub watched_date: String,
    pub name: String,
    pub year: String,
    pub source_uri: String,
    pub rating: Option<f64>,
    pub is_rewatch: bool,
    pub body: String,
    /// Reserved, always empty for now.
    pub tags: String,
    /// Empty on feed-derived entries.
    pub logged_date: String,
}

impl Review {
    /// Dedup key: two reviews are the same entry iff these match exactly.
    pub fn key(&self) -> (&str, &str) {
        (&self.watched_date, &self.name)
    }

    pub fn is_same_entry(&self, other: &Review) -> bool {
        self.key() == other.key()
    }
}

impl fmt::Display for Review {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rating {
            // f64's Display already drops trailing zeros (4.0 -> "4")
            Some(rating) => write!(f, "{} ({}) - {}/5: {}", self.name, self.year, rating, self.body),
            None => write!(f, "{} ({}) - No rating: {}", self.name, self.year, self.body),
        }
    }
}

/// On-disk row layout. Field order is the column order.
#[derive(Debug, Serialize, Deserialize)]
struct ReviewRecord {
    date: String,
    name: String,
    year: String,
    uri: String,
    rating: Option<f64>,
    rewatch: String,
    review: String,
    tags: String,
    watched_date: String,
}

impl From<ReviewRecord> for Review {
    fn from(record: ReviewRecord) -> Self {
        Review {
            watched_date: record.watched_date,
            name: record.name,
            year: record.year,
            source_uri: record.uri,
            rating: record.rating,
            is_rewatch: record.rewatch == "Yes",
            body: record.review,
            tags: record.tags,
            logged_date: record.date,
        }
    }
}

impl From<&Review> for ReviewRecord {
    fn from(review: &Review) -> Self {
        ReviewRecord {
            date: review.logged_date.clone(),
            name: review.name.clone(),
            year: review.year.clone(),
            uri: review.source_uri.clone(),
            rating: review.rating,
            rewatch: if review.is_rewatch { "Yes" } else { "No" }.to_string(),
            review: review.body.clone(),
            tags: review.tags.clone(),
            watched_date: review.watched_date.clone(),
        }
    }
}

/// Ordered collection of reviews, oldest persisted entries first.
#[derive(Debug, Clone, Default)]
pub struct ReviewStore {
    reviews: Vec<Review>,
}

impl ReviewStore {
    pub fn new() -> Self {
        Self { reviews: Vec::new() }
    }

    /// Loads every row of the file at `path`.
    ///
    /// Rows are kept as-is: duplicates already present in the file are not
    /// collapsed. A missing file, a row with fewer than nine fields or a
    /// rating that is neither empty nor a float is a `StorageError`.
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading reviews from: {:?}", path);
        let mut rdr = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)
            .map_err(|e| ReviewError::StorageError(format!("Failed to open {:?}: {}", path, e)))?;

        let mut reviews = Vec::new();
        for (index, result) in rdr.records().enumerate() {
            let row = index + 1;
            let record = result.map_err(|e| {
                ReviewError::StorageError(format!("Failed to read row {} of {:?}: {}", row, path, e))
            })?;
            if record.len() < REVIEW_COLUMNS {
                return Err(ReviewError::StorageError(format!(
                    "Row {} of {:?} has {} fields, expected {}",
                    row,
                    path,
                    record.len(),
                    REVIEW_COLUMNS
                )));
            }
            // Trailing extra columns are ignored.
            let record: StringRecord = record.iter().take(REVIEW_COLUMNS).collect();
            let decoded: ReviewRecord = record.deserialize(None).map_err(|e| {
                ReviewError::StorageError(format!("Malformed row {} of {:?}: {}", row, path, e))
            })?;
            reviews.push(Review::from(decoded));
        }

        info!("Loaded {} reviews from {:?}", reviews.len(), path);
        Ok(Self { reviews })
    }

    /// Rewrites the whole file at `path` with the current contents, in order.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut wtr = WriterBuilder::new()
            .has_headers(false)
            .from_path(path)
            .map_err(|e| ReviewError::StorageError(format!("Failed to create {:?}: {}", path, e)))?;

        for review in &self.reviews {
            wtr.serialize(ReviewRecord::from(review))?;
        }
        wtr.flush()?;

        debug!("Persisted {} reviews to {:?}", self.reviews.len(), path);
        Ok(())
    }

    /// True iff an existing entry shares `candidate`'s dedup key.
    pub fn contains(&self, candidate: &Review) -> bool {
        self.reviews.iter().any(|r| r.is_same_entry(candidate))
    }

    /// Appends `candidate` unless an entry with the same key exists.
    /// Returns whether it was added.
    pub fn push_if_new(&mut self, candidate: Review) -> bool {
        if self.contains(&candidate) {
            return false;
        }
        self.reviews.push(candidate);
        true
    }

    pub fn random_pick(&self) -> Result<&Review> {
        self.random_pick_with(&mut rand::thread_rng())
    }

    /// Uniform pick by index using the supplied generator.
    pub fn random_pick_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<&Review> {
        if self.reviews.is_empty() {
            return Err(ReviewError::EmptyStoreError);
        }
        let index = rng.gen_range(0..self.reviews.len());
        Ok(&self.reviews[index])
    }

    /// First entry whose name equals `title` exactly.
    pub fn find_by_title(&self, title: &str) -> Option<&Review> {
        self.reviews.iter().find(|r| r.name == title)
    }

    pub fn reviews(&self) -> &[Review] {
        &self.reviews
    }

    pub fn len(&self) -> usize {
        self.reviews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }
}

impl From<Vec<Review>> for ReviewStore {
    fn from(reviews: Vec<Review>) -> Self {
        Self { reviews }
    }
}
