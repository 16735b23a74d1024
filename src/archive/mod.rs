//! Archive module for persisting fetched pages
//!
//! This module handles everything that touches the archive directory:
//! - The `Archiver` trait the crawler writes through
//! - The filesystem implementation with atomic, idempotent writes
//! - Filename rules for story pages and comment-linked resources

mod filename;
mod fs;

pub use filename::{comment_file_name, make_safe_filename};
pub use fs::FsArchiver;

use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while archiving a payload
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Invalid archive path: {0}")]
    InvalidPath(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to persist {path}: {source}")]
    Persist {
        path: String,
        source: std::io::Error,
    },

    #[error("Archive task failed: {0}")]
    Task(String),
}

/// Result type for archive operations
pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Trait for archive backends
///
/// Paths are relative to the archive root. Implementations create missing
/// parent directories and overwrite existing files, so persisting the same
/// payload twice leaves the archive unchanged.
#[async_trait]
pub trait Archiver: Send + Sync {
    /// Stores `payload` at `relative_path` and returns the full path written
    async fn persist(&self, relative_path: &Path, payload: Bytes) -> ArchiveResult<PathBuf>;
}
