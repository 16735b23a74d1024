//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with user agent, timeout and proxy settings
//! - The process-wide admission gate bounding in-flight requests
//! - Classifying timeouts and transport failures into sentinel statuses
//! - Content-Type classification

use crate::config::{Config, UserAgentConfig};
use bytes::Bytes;
use reqwest::{header::CONTENT_TYPE, Client, Proxy};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Semaphore;

/// Status reported when a request exceeds its deadline
pub const TIMEOUT_STATUS: u16 = 408;

/// Status reported when a request fails below HTTP (connect, TLS, body read)
pub const TRANSPORT_FAILURE_STATUS: u16 = 599;

/// Media type assumed when a response carries no Content-Type header
const DEFAULT_MIME: &str = "application/octet-stream";

/// Kind of content a response carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentKind {
    /// `text/html`
    Html,

    /// Any other media type (lowercase, parameters stripped)
    Other(String),
}

impl ContentKind {
    /// Classifies a Content-Type header value
    ///
    /// # Example
    ///
    /// ```
    /// use ycrawler::crawler::ContentKind;
    ///
    /// assert_eq!(ContentKind::from_header(Some("text/html; charset=utf-8")), ContentKind::Html);
    /// assert!(!ContentKind::from_header(Some("application/pdf")).is_html());
    /// ```
    pub fn from_header(value: Option<&str>) -> Self {
        let mime = value
            .and_then(|v| v.split(';').next())
            .map(|v| v.trim().to_ascii_lowercase())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_MIME.to_string());

        if mime == "text/html" {
            Self::Html
        } else {
            Self::Other(mime)
        }
    }

    pub fn is_html(&self) -> bool {
        matches!(self, Self::Html)
    }

    pub fn mime(&self) -> &str {
        match self {
            Self::Html => "text/html",
            Self::Other(mime) => mime,
        }
    }
}

/// Why a fetch produced no response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    /// The request exceeded the per-request timeout
    Timeout,

    /// Connection, TLS, protocol or body read error
    Transport(String),
}

/// Result of a fetch operation
///
/// Fetching never returns an error. Failures show up as a sentinel status
/// with an empty body and a `failure` describing what went wrong.
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// The requested URL
    pub url: String,

    /// HTTP status code, or `TIMEOUT_STATUS` / `TRANSPORT_FAILURE_STATUS`
    pub status: u16,

    /// Content kind from the Content-Type header
    pub content_kind: ContentKind,

    /// Response body (empty on failure)
    pub body: Bytes,

    /// Set when no HTTP response was received
    pub failure: Option<FetchFailure>,
}

impl FetchResult {
    fn failed(url: &str, failure: FetchFailure) -> Self {
        let status = match failure {
            FetchFailure::Timeout => TIMEOUT_STATUS,
            FetchFailure::Transport(_) => TRANSPORT_FAILURE_STATUS,
        };

        Self {
            url: url.to_string(),
            status,
            content_kind: ContentKind::Other(DEFAULT_MIME.to_string()),
            body: Bytes::new(),
            failure: Some(failure),
        }
    }

    /// True for a 200 response with a non-empty body
    pub fn is_ok(&self) -> bool {
        self.status == 200 && !self.body.is_empty()
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self.failure, Some(FetchFailure::Timeout))
    }

    /// Body decoded as text, replacing invalid UTF-8
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Settings for building a `Fetcher`
#[derive(Debug, Clone)]
pub struct FetcherSettings {
    /// Maximum number of requests in flight at once
    pub max_concurrent: usize,

    /// Deadline for each request, including reading the body
    pub request_timeout: Duration,

    /// User agent header value
    pub user_agent: String,

    /// Proxy URL applied to every request
    pub proxy: Option<String>,
}

impl FetcherSettings {
    /// Derives fetcher settings from the crawler configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_concurrent: config.crawler.max_concurrent_fetches as usize,
            request_timeout: Duration::from_secs(config.crawler.request_timeout),
            user_agent: format_user_agent(&config.user_agent),
            proxy: config.crawler.proxy.clone(),
        }
    }
}

impl Default for FetcherSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Formats the user agent string: `CrawlerName/Version (+ContactURL)`
pub fn format_user_agent(config: &UserAgentConfig) -> String {
    match &config.contact_url {
        Some(contact) => format!(
            "{}/{} (+{})",
            config.crawler_name, config.crawler_version, contact
        ),
        None => format!("{}/{}", config.crawler_name, config.crawler_version),
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `settings` - The fetcher settings
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client (e.g. malformed proxy URL)
pub fn build_http_client(settings: &FetcherSettings) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .user_agent(settings.user_agent.clone())
        .timeout(settings.request_timeout)
        .gzip(true)
        .brotli(true);

    if let Some(proxy) = &settings.proxy {
        builder = builder.proxy(Proxy::all(proxy.as_str())?);
    }

    builder.build()
}

/// Issues GET requests under a shared admission gate
///
/// At most `max_concurrent` requests are in flight at any time across every
/// caller holding this fetcher. The permit covers the whole request,
/// including reading the body.
#[derive(Debug)]
pub struct Fetcher {
    client: Client,
    gate: Semaphore,
    max_concurrent: usize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl Fetcher {
    /// Creates a fetcher from settings
    pub fn new(settings: &FetcherSettings) -> Result<Self, reqwest::Error> {
        let client = build_http_client(settings)?;
        Ok(Self::with_client(client, settings.max_concurrent))
    }

    /// Creates a fetcher around an existing client
    ///
    /// Capacity is clamped to `1..=Semaphore::MAX_PERMITS`.
    pub fn with_client(client: Client, max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.clamp(1, Semaphore::MAX_PERMITS);
        Self {
            client,
            gate: Semaphore::new(max_concurrent),
            max_concurrent,
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Requests currently holding a permit
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneous requests observed so far
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Fetches a URL
    ///
    /// # Outcome
    ///
    /// | Condition | status | body |
    /// |-----------|--------|------|
    /// | HTTP response | response status | response body |
    /// | Timeout | 408 | empty |
    /// | Connection / TLS / body error | 599 | empty |
    ///
    /// No retries are made.
    pub async fn fetch(&self, url: &str) -> FetchResult {
        let _permit = match self.gate.acquire().await {
            Ok(permit) => permit,
            Err(_) => {
                tracing::error!("Admission gate closed, cannot fetch {}", url);
                return FetchResult::failed(
                    url,
                    FetchFailure::Transport("admission gate closed".to_string()),
                );
            }
        };
        let _guard = InFlightGuard::enter(&self.in_flight, &self.peak_in_flight);

        let result = self.get(url).await;

        match &result.failure {
            None => tracing::debug!(
                "Read URL {}, status {}, received {} bytes",
                url,
                result.status,
                result.body.len()
            ),
            Some(FetchFailure::Timeout) => tracing::error!("Timed out connecting to {}", url),
            Some(FetchFailure::Transport(error)) => {
                tracing::error!("Failed to fetch {}: {}", url, error)
            }
        }

        result
    }

    async fn get(&self, url: &str) -> FetchResult {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return FetchResult::failed(url, classify_error(&e)),
        };

        let status = response.status().as_u16();
        let content_kind = ContentKind::from_header(
            response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
        );

        match response.bytes().await {
            Ok(body) => FetchResult {
                url: url.to_string(),
                status,
                content_kind,
                body,
                failure: None,
            },
            Err(e) => FetchResult::failed(url, classify_error(&e)),
        }
    }
}

/// Maps a reqwest error onto a fetch failure
fn classify_error(error: &reqwest::Error) -> FetchFailure {
    if error.is_timeout() {
        FetchFailure::Timeout
    } else if error.is_connect() {
        FetchFailure::Transport(format!("connection failed: {}", error))
    } else {
        FetchFailure::Transport(error.to_string())
    }
}

/// Tracks one in-flight request for the fetcher's gauges
struct InFlightGuard<'a> {
    in_flight: &'a AtomicUsize,
}

impl<'a> InFlightGuard<'a> {
    fn enter(in_flight: &'a AtomicUsize, peak: &AtomicUsize) -> Self {
        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(now, Ordering::SeqCst);
        Self { in_flight }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
