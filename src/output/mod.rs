//! Output module for reporting crawl results
//!
//! This module handles reporting of what the crawler did:
//! - Per-cycle statistics logged after each front page is dispatched
//! - An optional markdown index of archived stories at the archive root

mod index;
mod stats;

pub use index::{format_index, write_index, INDEX_FILE};
pub use stats::CycleStats;
