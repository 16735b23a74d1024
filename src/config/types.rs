use serde::Deserialize;

/// Default site whose front page is polled
pub const DEFAULT_SITE: &str = "https://news.ycombinator.com";

/// Main configuration structure for YCrawler
///
/// Every section and key is optional; missing values take their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Site whose front page is polled
    pub site: String,

    /// Number of top stories considered each cycle
    #[serde(rename = "top-news-count")]
    pub top_news_count: usize,

    /// Seconds to wait between poll cycles
    #[serde(rename = "poll-interval")]
    pub poll_interval: u64,

    /// Maximum number of fetches in flight across the whole process
    #[serde(rename = "max-concurrent-fetches")]
    pub max_concurrent_fetches: u32,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout")]
    pub request_timeout: u64,

    /// Comment links of one story fetched concurrently
    /// (defaults to `max-concurrent-fetches`)
    #[serde(rename = "comment-fanout")]
    pub comment_fanout: Option<u32>,

    /// Stop after a single cycle
    #[serde(rename = "run-once")]
    pub run_once: bool,

    /// Proxy URL for every request
    pub proxy: Option<String>,
}

impl CrawlerConfig {
    /// Number of comment links fetched concurrently for one story
    pub fn effective_comment_fanout(&self) -> usize {
        self.comment_fanout
            .unwrap_or(self.max_concurrent_fetches)
            .max(1) as usize
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            site: DEFAULT_SITE.to_string(),
            top_news_count: 5,
            poll_interval: 60,
            max_concurrent_fetches: 10,
            request_timeout: 5,
            comment_fanout: None,
            run_once: false,
            proxy: None,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "YCrawler".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory the archive is written to
    #[serde(rename = "archive-root")]
    pub archive_root: String,

    /// Write `index.md` listing archived stories after each cycle
    #[serde(rename = "write-index")]
    pub write_index: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            archive_root: "web".to_string(),
            write_index: false,
        }
    }
}
