pub mod settings;

pub use settings::Config;

use crate::error::ReviewError;
use clap::Parser;
use std::str::FromStr;
use std::sync::Arc;

/// Parses the command line (with `.env` and environment fallbacks) and
/// validates the result. Values are fixed for the life of the process.
pub fn load_config() -> Result<Arc<Config>, ReviewError> {
    dotenv::dotenv().ok(); // Load .env file if present, ignore errors
    // Exits the process on --help/--version or unparseable arguments.
    let config = Config::parse();
    validate(&config)?;
    Ok(Arc::new(config))
}

pub fn validate(config: &Config) -> Result<(), ReviewError> {
    if config.owner_handle.trim().is_empty() {
        return Err(ReviewError::ConfigError("Letterboxd ID cannot be empty".to_string()));
    }
    if config.storage_path.as_os_str().is_empty() {
        return Err(ReviewError::ConfigError("Storage path cannot be empty".to_string()));
    }
    log::LevelFilter::from_str(&config.log_level).map_err(|_| {
        ReviewError::ConfigError(format!("Unknown log level: {}", config.log_level))
    })?;
    let feed_host = url::Url::parse(&config.feed_host)
        .map_err(|e| ReviewError::ConfigError(format!("Invalid feed host {}: {}", config.feed_host, e)))?;
    if !matches!(feed_host.scheme(), "http" | "https") {
        return Err(ReviewError::ConfigError(format!(
            "Feed host must be http(s), got {}",
            feed_host.scheme()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn parse(args: &[&str]) -> Config {
        let mut argv = vec!["lbxd-review-api"];
        argv.extend_from_slice(args);
        Config::parse_from(argv)
    }

    #[test]
    fn test_short_flags() {
        let config = parse(&["-i", "0.0.0.0", "-p", "9000", "-l", "someone"]);
        assert_eq!(config.bind_address(), "0.0.0.0:9000");
        assert_eq!(config.owner_handle, "someone");
        assert!(validate(&config).is_ok());
        config.log_summary();
    }

    #[test]
    fn test_storage_flag() {
        let config = parse(&["--storage", "/tmp/r.csv"]);
        assert_eq!(config.storage_path, PathBuf::from("/tmp/r.csv"));
    }

    #[test]
    fn test_rejects_empty_handle() {
        let config = parse(&["-l", " "]);
        assert!(matches!(validate(&config), Err(ReviewError::ConfigError(_))));
    }

    #[test]
    fn test_rejects_non_http_feed_host() {
        let config = parse(&["--feed-host", "ftp://letterboxd.com"]);
        assert!(matches!(validate(&config), Err(ReviewError::ConfigError(_))));
    }

    #[test]
    fn test_rejects_unknown_log_level() {
        let config = parse(&["--log-level", "loud"]);
        assert!(matches!(validate(&config), Err(ReviewError::ConfigError(_))));
    }
}
