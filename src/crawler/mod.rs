//! Crawler module for fetching and archiving stories
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching under a process-wide concurrency limit
//! - Story processing (detail page plus comment links)
//! - The poll / dispatch / sleep loop

mod coordinator;
mod fetcher;
mod processor;

pub use coordinator::{CrawlLoop, StopReason};
pub use fetcher::{
    build_http_client, format_user_agent, ContentKind, FetchFailure, FetchResult, Fetcher,
    FetcherSettings, TIMEOUT_STATUS, TRANSPORT_FAILURE_STATUS,
};
pub use processor::{ArchivedStory, StoryProcessor, COMMENTS_DIR};

use crate::config::Config;
use crate::CrawlerError;
use tokio_util::sync::CancellationToken;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP client, extractor and archiver from the configuration
/// 2. Poll the front page and archive new top stories
/// 3. Repeat every poll interval, or stop after one cycle in single-pass mode
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `cancel` - Token that stops the crawl when cancelled
///
/// # Returns
///
/// * `Ok(StopReason)` - Crawl finished or was cancelled
/// * `Err(CrawlerError)` - Crawl failed
pub async fn crawl(config: Config, cancel: CancellationToken) -> Result<StopReason, CrawlerError> {
    CrawlLoop::new(&config, cancel)?.run().await
}
