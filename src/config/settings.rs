use clap::Parser;
use std::path::PathBuf;

/// Serves a random film review from a Letterboxd member's RSS feed.
#[derive(Debug, Clone, Parser)]
#[command(name = "lbxd-review-api", version, about)]
pub struct Config {
    /// API host IP
    #[arg(short = 'i', long, env = "LBXD_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// API port
    #[arg(short = 'p', long, env = "LBXD_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Letterboxd ID to get RSS reviews from
    #[arg(short = 'l', long = "letterboxd", env = "LBXD_USER", default_value = "itswill")]
    pub owner_handle: String,

    /// CSV file the reviews are persisted to
    #[arg(short = 's', long = "storage", env = "LBXD_STORAGE", default_value = "./data/reviews.csv")]
    pub storage_path: PathBuf,

    /// Base URL the `<handle>/rss` path is appended to
    #[arg(long, env = "LBXD_FEED_HOST", default_value = "https://letterboxd.com")]
    pub feed_host: String,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, env = "LBXD_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Print reviews longer than N characters and exit instead of serving
    #[arg(long, value_name = "N")]
    pub list_long: Option<usize>,
}

impl Config {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn log_summary(&self) {
        log::info!("Application Configuration Loaded: {:?}", self);
    }
}
