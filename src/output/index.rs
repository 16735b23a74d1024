//! Markdown index of archived stories
//!
//! Lists every story in the seen set with a link to its archived page, so the
//! archive root can be browsed without knowing story ids.

use crate::archive::{make_safe_filename, ArchiveResult, Archiver};
use crate::state::SeenSet;
use bytes::Bytes;
use std::path::{Path, PathBuf};

/// Name of the index file at the archive root
pub const INDEX_FILE: &str = "index.md";

/// Formats the seen set as a markdown table
///
/// # Arguments
///
/// * `seen` - The stories archived so far
///
/// # Returns
///
/// A markdown document, one row per story in archival order
pub fn format_index(seen: &SeenSet) -> String {
    let mut md = String::new();

    md.push_str("# Archived Stories\n\n");
    md.push_str(&format!("- **Stories**: {}\n\n", seen.len()));

    if seen.is_empty() {
        md.push_str("_No stories archived yet._\n");
        return md;
    }

    md.push_str("| Story | Title | Archived | Source |\n");
    md.push_str("|-------|-------|----------|--------|\n");

    for (id, entry) in seen.iter() {
        let page = format!("{}/{}", id, make_safe_filename(&entry.title));
        md.push_str(&format!(
            "| {} | [{}](<{}>) | {} | <{}> |\n",
            id,
            escape_cell(&entry.title),
            page,
            entry.archived_at.format("%Y-%m-%d %H:%M:%S UTC"),
            entry.url
        ));
    }

    md
}

/// Writes the index through the archiver
pub async fn write_index(archiver: &dyn Archiver, seen: &SeenSet) -> ArchiveResult<PathBuf> {
    let markdown = format_index(seen);
    archiver
        .persist(Path::new(INDEX_FILE), Bytes::from(markdown))
        .await
}

/// Escapes characters that would break a markdown table cell or link text
fn escape_cell(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '|' | '[' | ']' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '\n' | '\r' => escaped.push(' '),
            _ => escaped.push(c),
        }
    }
    escaped
}
