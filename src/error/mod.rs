// src/error/mod.rs
//! Crate-wide error type for the review store, the feed refresher and the API.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ReviewError {
    /// Persisted review file missing, unreadable or malformed
    #[error("Storage Error: {0}")]
    StorageError(String),

    /// Network/transport failure reaching the feed
    #[error("Feed Fetch Error: {0}")]
    FeedFetchError(String),

    /// Feed document or entry does not have the expected shape
    #[error("Feed Parse Error: {0}")]
    FeedParseError(String),

    /// Random pick requested on a store with zero entries
    #[error("Review store is empty, nothing to pick from")]
    EmptyStoreError,

    /// Configuration errors
    #[error("Config Error: {0}")]
    ConfigError(String),

    /// HTTP server bind/serve failures
    #[error("Server Error: {0}")]
    ServerError(String),
}

impl From<csv::Error> for ReviewError {
    fn from(err: csv::Error) -> Self {
        ReviewError::StorageError(format!("CSV error: {}", err))
    }
}

impl From<std::io::Error> for ReviewError {
    fn from(err: std::io::Error) -> Self {
        ReviewError::StorageError(format!("I/O error: {}", err))
    }
}

impl From<reqwest::Error> for ReviewError {
    fn from(err: reqwest::Error) -> Self {
        ReviewError::FeedFetchError(format!("HTTP client error: {}", err))
    }
}

impl From<quick_xml::Error> for ReviewError {
    fn from(err: quick_xml::Error) -> Self {
        ReviewError::FeedParseError(format!("XML error: {}", err))
    }
}

impl ReviewError {
    /// Whether a later attempt at the same operation could succeed without
    /// anything on disk or in configuration changing.
    pub fn is_recoverable(&self) -> bool {
        match self {
            ReviewError::StorageError(_) => false, // File needs fixing
            ReviewError::FeedFetchError(_) => true, // Next stale read refetches
            ReviewError::FeedParseError(_) => false,
            ReviewError::EmptyStoreError => true, // A refresh may bring entries
            ReviewError::ConfigError(_) => false,
            ReviewError::ServerError(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ReviewError>;
