//! Per-cycle crawl statistics
//!
//! Counters collected while the crawl loop dispatches one front page, logged
//! at the end of every cycle.

use std::fmt;
use std::time::Duration;

/// Counters for one poll cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleStats {
    /// 1-based cycle number within the process
    pub cycle: u64,

    /// Story entries found on the front page
    pub stories_listed: usize,

    /// Entries within the top-N window
    pub stories_considered: usize,

    /// Entries skipped because they were archived in an earlier cycle
    pub stories_already_seen: usize,

    /// Stories whose detail page was archived this cycle
    pub stories_archived: usize,

    /// Stories that could not be fetched or archived
    pub stories_failed: usize,

    /// Comment-linked resources archived
    pub comment_links_archived: usize,

    /// Comment-linked resources that failed to fetch or write
    pub comment_links_failed: usize,

    /// Wall time of the cycle
    pub elapsed: Duration,
}

impl CycleStats {
    pub fn new(cycle: u64) -> Self {
        Self {
            cycle,
            ..Self::default()
        }
    }

    /// Total comment links attempted
    pub fn comment_links_total(&self) -> usize {
        self.comment_links_archived + self.comment_links_failed
    }

    /// Percentage of comment links archived; 100 when none were attempted
    fn comment_link_success_rate(&self) -> f64 {
        let total = self.comment_links_total();
        if total == 0 {
            100.0
        } else {
            self.comment_links_archived as f64 / total as f64 * 100.0
        }
    }
}

impl fmt::Display for CycleStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cycle {}: {} listed, {} considered, {} already seen, {} archived, {} failed; \
             comment links {}/{} archived ({:.1}%) in {:.2}s",
            self.cycle,
            self.stories_listed,
            self.stories_considered,
            self.stories_already_seen,
            self.stories_archived,
            self.stories_failed,
            self.comment_links_archived,
            self.comment_links_total(),
            self.comment_link_success_rate(),
            self.elapsed.as_secs_f64()
        )
    }
}
