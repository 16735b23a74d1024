//! YCrawler: an archiving crawler for a news aggregator front page
//!
//! This crate polls the front page of a news aggregation site, picks the top
//! stories, and archives each story's detail page together with every
//! outbound link found in its comment thread. Stories archived earlier in the
//! same process are not fetched again.

pub mod archive;
pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for YCrawler operations
#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to build HTTP client: {source}")]
    HttpClient { source: reqwest::Error },

    #[error("Front page {url} unavailable (status {status})")]
    FrontPageUnavailable { url: String, status: u16 },

    #[error("Archive error: {0}")]
    Archive(#[from] archive::ArchiveError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CrawlState,
        to: state::CrawlState,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for YCrawler operations
pub type Result<T> = std::result::Result<T, CrawlerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{crawl, CrawlLoop, StopReason};
pub use state::{CrawlState, SeenSet};
