use crate::archive::{ArchiveError, ArchiveResult, Archiver};
use async_trait::async_trait;
use bytes::Bytes;
use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use tempfile::NamedTempFile;

/// Archiver that writes below a root directory on the local filesystem
///
/// Each payload is written to a temporary file next to its destination and
/// renamed into place, so a destination file is either absent, the previous
/// version, or the complete new payload. The write runs on the blocking pool
/// and finishes even if the awaiting task is dropped.
#[derive(Debug, Clone)]
pub struct FsArchiver {
    root: PathBuf,
}

impl FsArchiver {
    /// Creates an archiver rooted at `root`. The directory is created on the
    /// first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Joins a relative path onto the root, rejecting anything that could
    /// escape it
    fn resolve(&self, relative_path: &Path) -> ArchiveResult<PathBuf> {
        let mut resolved = self.root.clone();
        let mut segments = 0;

        for component in relative_path.components() {
            match component {
                Component::Normal(segment) => {
                    resolved.push(segment);
                    segments += 1;
                }
                Component::CurDir => {}
                _ => {
                    return Err(ArchiveError::InvalidPath(
                        relative_path.display().to_string(),
                    ))
                }
            }
        }

        if segments == 0 {
            return Err(ArchiveError::InvalidPath(
                relative_path.display().to_string(),
            ));
        }

        Ok(resolved)
    }
}

#[async_trait]
impl Archiver for FsArchiver {
    async fn persist(&self, relative_path: &Path, payload: Bytes) -> ArchiveResult<PathBuf> {
        let target = self.resolve(relative_path)?;

        tokio::task::spawn_blocking(move || -> ArchiveResult<PathBuf> {
            write_atomic(&target, &payload)?;
            tracing::debug!("Wrote {} bytes to {}", payload.len(), target.display());
            Ok(target)
        })
        .await
        .map_err(|e| ArchiveError::Task(e.to_string()))?
    }
}

/// Atomically writes `payload` to `target` by writing a temp file then renaming
fn write_atomic(target: &Path, payload: &[u8]) -> ArchiveResult<()> {
    let parent = target
        .parent()
        .ok_or_else(|| ArchiveError::InvalidPath(target.display().to_string()))?;
    fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(payload)?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;

    tmp.persist(target).map_err(|e| ArchiveError::Persist {
        path: target.display().to_string(),
        source: e.error,
    })?;

    Ok(())
}
