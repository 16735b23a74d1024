//! State module for tracking crawl progress
//!
//! This module provides the state owned by the crawl loop across poll cycles.
//!
//! # Components
//!
//! - `CrawlState`: The phase of the crawl loop (polling, dispatching, sleeping, stopped)
//! - `SeenSet`: Stories already archived in this process, keyed by story identifier

mod crawl_state;
mod seen;

// Re-export main types
pub use crawl_state::CrawlState;
pub use seen::{SeenEntry, SeenSet};
