/// Crawl loop state definitions
///
/// This module defines the phases the crawl loop moves through during a run.
use std::fmt;

/// Represents the current phase of the crawl loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlState {
    // ===== Active States =====
    /// Fetching the front page
    Polling,

    /// Processing the stories listed on the front page
    Dispatching,

    /// Waiting for the next poll
    Sleeping,

    // ===== Terminal State =====
    /// The run is over (single pass done, cancelled, or front page unavailable)
    Stopped,
}

impl CrawlState {
    /// Returns true if the loop will not leave this state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped)
    }

    /// Returns true if this state is part of the poll cycle
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if the loop may move from this state to `next`
    ///
    /// The cycle is `Polling -> Dispatching -> Sleeping -> Polling`; every
    /// active state may stop. Nothing leaves `Stopped`.
    pub fn can_transition_to(&self, next: CrawlState) -> bool {
        match (self, next) {
            (Self::Stopped, _) => false,
            (_, Self::Stopped) => true,
            (Self::Polling, Self::Dispatching) => true,
            (Self::Dispatching, Self::Sleeping) => true,
            (Self::Sleeping, Self::Polling) => true,
            _ => false,
        }
    }

    /// Short lowercase name used in log records
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Polling => "polling",
            Self::Dispatching => "dispatching",
            Self::Sleeping => "sleeping",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
