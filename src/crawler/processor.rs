//! Story processing
//!
//! Archives one story: its detail page first, then every resource linked
//! from its comments. Comment-link failures are logged and counted but never
//! abort the story.

use crate::archive::{comment_file_name, make_safe_filename, Archiver};
use crate::crawler::fetcher::Fetcher;
use crate::extract::{CommentLink, ContentExtractor, Headline, StoryEntry};
use crate::url::item_url;
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;

/// Directory below a story that holds comment-linked resources
pub const COMMENTS_DIR: &str = "comments";

/// Outcome of archiving one story
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedStory {
    /// Story identifier
    pub id: String,

    /// Title and canonical URL
    pub headline: Headline,

    /// Where the detail page was written
    pub path: PathBuf,

    /// Comment-linked resources written
    pub links_archived: usize,

    /// Comment links that failed to fetch or write
    pub links_failed: usize,
}

/// Archives stories and their comment links
pub struct StoryProcessor {
    site: Url,
    extractor: Arc<dyn ContentExtractor>,
    archiver: Arc<dyn Archiver>,
    comment_fanout: usize,
}

impl StoryProcessor {
    /// Creates a processor
    ///
    /// # Arguments
    ///
    /// * `site` - Site the story detail pages live on
    /// * `extractor` - Markup extractor for story and comment pages
    /// * `archiver` - Destination for archived payloads
    /// * `comment_fanout` - Comment links fetched concurrently per story
    pub fn new(
        site: Url,
        extractor: Arc<dyn ContentExtractor>,
        archiver: Arc<dyn Archiver>,
        comment_fanout: usize,
    ) -> Self {
        Self {
            site,
            extractor,
            archiver,
            comment_fanout: comment_fanout.max(1),
        }
    }

    /// Archives a story and its comment links
    ///
    /// Returns None when the detail page could not be fetched, carries no
    /// headline, or could not be written. The story is then left for the
    /// next cycle.
    pub async fn process(&self, entry: &StoryEntry, fetcher: &Fetcher) -> Option<ArchivedStory> {
        let url = match item_url(&self.site, &entry.id) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!("Cannot build detail URL for story {}: {}", entry.id, e);
                return None;
            }
        };
        tracing::info!("Parsing item {} (rank {})", url, entry.rank);

        let page = fetcher.fetch(url.as_str()).await;
        if !page.is_ok() {
            tracing::info!("No response from {} status code - {}", url, page.status);
            return None;
        }
        let markup = page.text();

        let headline = match self
            .extractor
            .story_headline(&markup)
            .or_else(|| self.extractor.story_headline(&entry.markup))
        {
            Some(headline) => headline,
            None => {
                tracing::error!("No title line found for story {}", entry.id);
                return None;
            }
        };
        tracing::info!("News: {}\t{}\t{}", entry.id, headline.title, headline.url);

        let story_path = Path::new(&entry.id).join(make_safe_filename(&headline.title));
        let path = match self.archiver.persist(&story_path, page.body.clone()).await {
            Ok(path) => path,
            Err(e) => {
                tracing::error!("Failed to archive story {}: {}", entry.id, e);
                return None;
            }
        };

        let (links_archived, links_failed) = self
            .archive_comment_links(&entry.id, &markup, fetcher)
            .await;

        Some(ArchivedStory {
            id: entry.id.clone(),
            headline,
            path,
            links_archived,
            links_failed,
        })
    }

    /// Fetches and archives every comment link; returns (archived, failed)
    async fn archive_comment_links(
        &self,
        story_id: &str,
        markup: &str,
        fetcher: &Fetcher,
    ) -> (usize, usize) {
        let links: Vec<CommentLink> = self
            .extractor
            .comment_links(markup)
            .iter()
            .flat_map(|comment| comment.links().collect::<Vec<_>>())
            .collect();

        if links.is_empty() {
            tracing::debug!("Story {} has no comment links", story_id);
            return (0, 0);
        }
        tracing::debug!("Story {} has {} comment links", story_id, links.len());

        let comments_dir = Path::new(story_id).join(COMMENTS_DIR);
        let outcomes: Vec<bool> = stream::iter(links)
            .map(|link| self.archive_comment_link(&comments_dir, link, fetcher))
            .buffer_unordered(self.comment_fanout)
            .collect()
            .await;

        let archived = outcomes.iter().filter(|ok| **ok).count();
        (archived, outcomes.len() - archived)
    }

    /// Archives one comment link; false if it was skipped
    async fn archive_comment_link(
        &self,
        comments_dir: &Path,
        link: CommentLink,
        fetcher: &Fetcher,
    ) -> bool {
        let result = fetcher.fetch(&link.url).await;
        if !result.is_ok() {
            tracing::error!(
                "Error {} downloading comment link {}",
                result.status,
                link.url
            );
            return false;
        }

        let file_name = comment_file_name(
            &link.comment_id,
            link.ordinal,
            &result.content_kind,
            &link.url,
        );

        match self
            .archiver
            .persist(&comments_dir.join(file_name), result.body)
            .await
        {
            Ok(path) => {
                tracing::debug!(
                    "Archived comment link {} ({}) to {}",
                    link.url,
                    result.content_kind.mime(),
                    path.display()
                );
                true
            }
            Err(e) => {
                tracing::error!("Failed to archive comment link {}: {}", link.url, e);
                false
            }
        }
    }
}
