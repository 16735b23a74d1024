//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the poll loop that coordinates a crawl run:
//! - Fetching the front page and selecting the top stories
//! - Skipping stories archived in an earlier cycle
//! - Dispatching each new story to the story processor, one at a time
//! - Sleeping between cycles and stopping on cancellation

use crate::archive::{Archiver, FsArchiver};
use crate::config::Config;
use crate::crawler::fetcher::{Fetcher, FetcherSettings};
use crate::crawler::processor::StoryProcessor;
use crate::extract::{ContentExtractor, HackerNewsExtractor};
use crate::output::{write_index, CycleStats};
use crate::state::{CrawlState, SeenEntry, SeenSet};
use crate::CrawlerError;
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Why a crawl run ended without an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Single-pass mode finished its cycle
    Completed,

    /// The cancellation token fired
    Cancelled,
}

/// Main crawl loop
///
/// Owns the fetcher, the story processor and the seen set. The seen set is
/// only modified between stories while dispatching, so it needs no lock.
pub struct CrawlLoop {
    site: Url,
    top_news_count: usize,
    poll_interval: Duration,
    run_once: bool,
    write_index: bool,
    fetcher: Fetcher,
    extractor: Arc<dyn ContentExtractor>,
    archiver: Arc<dyn Archiver>,
    processor: StoryProcessor,
    seen: SeenSet,
    state: CrawlState,
    cycles: u64,
    cancel: CancellationToken,
}

impl CrawlLoop {
    /// Creates a crawl loop for the Hacker News layout, archiving to the
    /// configured root directory
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `cancel` - Token that stops the run when cancelled
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlLoop)` - Ready to run
    /// * `Err(CrawlerError)` - Invalid site URL or HTTP client settings
    pub fn new(config: &Config, cancel: CancellationToken) -> Result<Self, CrawlerError> {
        let site = Url::parse(&config.crawler.site)?;
        let fetcher = Fetcher::new(&FetcherSettings::from_config(config))
            .map_err(|source| CrawlerError::HttpClient { source })?;
        let extractor = Arc::new(HackerNewsExtractor::new(site));
        let archiver = Arc::new(FsArchiver::new(&config.output.archive_root));
        tracing::debug!("Archiving to {}", archiver.root().display());

        Self::from_parts(config, fetcher, extractor, archiver, cancel)
    }

    /// Creates a crawl loop from explicit collaborators
    pub fn from_parts(
        config: &Config,
        fetcher: Fetcher,
        extractor: Arc<dyn ContentExtractor>,
        archiver: Arc<dyn Archiver>,
        cancel: CancellationToken,
    ) -> Result<Self, CrawlerError> {
        let site = Url::parse(&config.crawler.site)?;
        let processor = StoryProcessor::new(
            site.clone(),
            extractor.clone(),
            archiver.clone(),
            config.crawler.effective_comment_fanout(),
        );

        Ok(Self {
            site,
            top_news_count: config.crawler.top_news_count,
            poll_interval: Duration::from_secs(config.crawler.poll_interval),
            run_once: config.crawler.run_once,
            write_index: config.output.write_index,
            fetcher,
            extractor,
            archiver,
            processor,
            seen: SeenSet::new(),
            state: CrawlState::Polling,
            cycles: 0,
            cancel,
        })
    }

    /// Stories archived so far
    pub fn seen(&self) -> &SeenSet {
        &self.seen
    }

    pub fn state(&self) -> CrawlState {
        self.state
    }

    /// The fetcher shared by every request of this loop
    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// Number of cycles started
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Runs until single-pass completion, cancellation, or a front page failure
    ///
    /// # Returns
    ///
    /// * `Ok(StopReason)` - The run ended normally
    /// * `Err(CrawlerError)` - The front page could not be fetched or parsed
    pub async fn run(&mut self) -> Result<StopReason, CrawlerError> {
        tracing::info!(
            "Starting web crawler at {}, check period {} seconds. Downloading {} top news. Run_once={}",
            self.site,
            self.poll_interval.as_secs(),
            self.top_news_count,
            self.run_once
        );

        let cancel = self.cancel.clone();

        loop {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = self.run_cycle() => Some(result),
            };

            match outcome {
                None => return Ok(self.cancelled()),
                Some(Err(e)) => {
                    self.stop();
                    return Err(e);
                }
                Some(Ok(_)) => {}
            }

            if self.run_once {
                self.transition(CrawlState::Stopped)?;
                return Ok(StopReason::Completed);
            }

            tracing::info!("Waiting for {} seconds...", self.poll_interval.as_secs());
            let woke = tokio::select! {
                biased;
                _ = cancel.cancelled() => false,
                _ = tokio::time::sleep(self.poll_interval) => true,
            };
            if !woke {
                return Ok(self.cancelled());
            }
            tracing::info!("Repeat parsing news cycle");
        }
    }

    /// Runs one poll cycle: fetch the front page and dispatch the top stories
    ///
    /// Leaves the loop in `Sleeping` on success and in `Stopped` when the
    /// front page is unavailable.
    pub async fn run_cycle(&mut self) -> Result<CycleStats, CrawlerError> {
        if self.state != CrawlState::Polling {
            self.transition(CrawlState::Polling)?;
        }

        self.cycles += 1;
        let started = Instant::now();
        let mut stats = CycleStats::new(self.cycles);

        let front_url = self.site.to_string();
        let page = self.fetcher.fetch(&front_url).await;
        if !page.is_ok() {
            tracing::error!("Error {} fetching front page {}", page.status, front_url);
            self.stop();
            return Err(CrawlerError::FrontPageUnavailable {
                url: front_url,
                status: page.status,
            });
        }

        let entries = self.extractor.story_entries(&page.text());
        if entries.is_empty() {
            tracing::error!("No news found on {}", front_url);
            self.stop();
            return Err(CrawlerError::FrontPageUnavailable {
                url: front_url,
                status: page.status,
            });
        }
        stats.stories_listed = entries.len();

        self.transition(CrawlState::Dispatching)?;

        for entry in entries.iter().take(self.top_news_count) {
            stats.stories_considered += 1;

            if self.seen.contains(&entry.id) {
                tracing::debug!("News item {} already parsed", entry.id);
                stats.stories_already_seen += 1;
                continue;
            }

            match self.processor.process(entry, &self.fetcher).await {
                Some(story) => {
                    stats.stories_archived += 1;
                    stats.comment_links_archived += story.links_archived;
                    stats.comment_links_failed += story.links_failed;
                    self.seen.insert(
                        story.id,
                        SeenEntry {
                            title: story.headline.title,
                            url: story.headline.url,
                            archived_at: Utc::now(),
                        },
                    );
                }
                None => stats.stories_failed += 1,
            }
        }

        if self.write_index {
            match write_index(self.archiver.as_ref(), &self.seen).await {
                Ok(path) => tracing::debug!("Updated index {}", path.display()),
                Err(e) => tracing::error!("Failed to write index: {}", e),
            }
        }

        stats.elapsed = started.elapsed();
        tracing::info!("End parsing news {}", stats);

        self.transition(CrawlState::Sleeping)?;
        Ok(stats)
    }

    /// Moves to `next`, rejecting transitions the state machine does not allow
    fn transition(&mut self, next: CrawlState) -> Result<(), CrawlerError> {
        if !self.state.can_transition_to(next) {
            return Err(CrawlerError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::trace!("Crawl state {} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }

    /// Moves to `Stopped` from whatever state the loop is in
    fn stop(&mut self) {
        if self.state.is_active() {
            tracing::trace!("Crawl state {} -> {}", self.state, CrawlState::Stopped);
            self.state = CrawlState::Stopped;
        }
    }

    fn cancelled(&mut self) -> StopReason {
        tracing::info!(
            "Crawl cancelled during {} after {} cycles ({} stories archived)",
            self.state,
            self.cycles,
            self.seen.len()
        );
        self.stop();
        StopReason::Cancelled
    }
}
