pub mod api;
pub mod config;
pub mod error;
pub mod feed;
pub mod store;
pub mod utils;

pub use error::ReviewError;
pub use feed::{FeedRefresher, FeedSource, HttpFeedSource};
pub use store::{Review, ReviewStore};
