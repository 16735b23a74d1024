//! Hacker News markup extractor
//!
//! Front page stories are `tr.athing` rows carrying the story id, with the
//! headline in `.titleline > a`. Comments on a detail page are
//! `tr.athing.comtr` rows inside the `.comment-tree` table; the comment body
//! is the `.commtext` block.

use crate::extract::{is_valid_id, CommentLinks, ContentExtractor, Headline, StoryEntry};
use crate::url::resolve_link;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

const STORY_ROW: &str = "tr.athing[id]";
const TITLE_LINK: &str = ".titleline > a";
const COMMENT_ROW: &str = ".comment-tree tr.athing.comtr[id]";
const COMMENT_LINK: &str = ".commtext a[href]";

/// Extractor for the Hacker News page layout
#[derive(Debug, Clone)]
pub struct HackerNewsExtractor {
    /// Base for resolving relative links
    site: Url,
}

impl HackerNewsExtractor {
    pub fn new(site: Url) -> Self {
        Self { site }
    }
}

fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            tracing::error!("Invalid selector {}: {:?}", css, e);
            None
        }
    }
}

impl ContentExtractor for HackerNewsExtractor {
    fn story_entries(&self, front_page: &str) -> Vec<StoryEntry> {
        let Some(row_selector) = selector(STORY_ROW) else {
            return Vec::new();
        };

        let document = Html::parse_document(front_page);
        let mut seen_ids = HashSet::new();
        let mut entries = Vec::new();

        for row in document.select(&row_selector) {
            let Some(id) = row.value().attr("id") else {
                continue;
            };

            if !is_valid_id(id) {
                tracing::warn!("Ignoring story row with unexpected id {:?}", id);
                continue;
            }

            if !seen_ids.insert(id.to_string()) {
                continue;
            }

            entries.push(StoryEntry {
                id: id.to_string(),
                rank: entries.len() + 1,
                // Keep the row parseable on its own
                markup: format!("<table>{}</table>", row.html()),
            });
        }

        entries
    }

    fn story_headline(&self, markup: &str) -> Option<Headline> {
        let title_selector = selector(TITLE_LINK)?;
        let document = Html::parse_document(markup);

        let link = document.select(&title_selector).next()?;
        let title = link.text().collect::<String>().trim().to_string();
        if title.is_empty() {
            return None;
        }

        let url = resolve_link(link.value().attr("href")?, &self.site)?;

        Some(Headline { title, url })
    }

    fn comment_links(&self, story_page: &str) -> Vec<CommentLinks> {
        let (Some(row_selector), Some(link_selector)) = (selector(COMMENT_ROW), selector(COMMENT_LINK))
        else {
            return Vec::new();
        };

        let document = Html::parse_document(story_page);
        let mut comments = Vec::new();

        for row in document.select(&row_selector) {
            let Some(comment_id) = row.value().attr("id").filter(|id| is_valid_id(id)) else {
                continue;
            };

            let urls: Vec<String> = row
                .select(&link_selector)
                .filter_map(|a| a.value().attr("href"))
                .filter_map(|href| resolve_link(href, &self.site))
                .collect();

            if !urls.is_empty() {
                comments.push(CommentLinks {
                    comment_id: comment_id.to_string(),
                    urls,
                });
            }
        }

        comments
    }
}
