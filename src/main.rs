// src/main.rs
use anyhow::Context;
use lbxd_review_api::{
    api::ApiServer,
    config::load_config,
    feed::{FeedRefresher, HttpFeedSource},
    utils::setup_logging,
};
use log::info;
use std::str::FromStr;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config()?;
    let level = log::LevelFilter::from_str(&config.log_level).unwrap_or(log::LevelFilter::Info);
    setup_logging(level).context("Failed to initialize logging")?;
    config.log_summary();

    let source = HttpFeedSource::new(&config.feed_host, &config.owner_handle);
    let refresher = FeedRefresher::initialize(
        config.owner_handle.clone(),
        config.storage_path.clone(),
        Box::new(source),
    )
    .await
    .with_context(|| format!("Failed to initialize reviews from {:?}", config.storage_path))?;
    info!("Loaded {} reviews for '{}'", refresher.reviews().len(), refresher.owner_handle());

    if let Some(min_len) = config.list_long {
        for formatted in refresher.long_reviews(min_len) {
            let len = formatted.chars().count();
            let head: String = formatted.chars().take(100).collect();
            println!("{} - {} ...", len, head);
        }
        return Ok(());
    }

    ApiServer::new(config.bind_address(), refresher).start().await?;
    Ok(())
}
