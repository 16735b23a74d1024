//! Content extraction from site markup
//!
//! The crawler only needs three things from the pages it downloads: the story
//! entries on the front page, the headline of a story, and the outbound links
//! in its comments. `ContentExtractor` exposes exactly those; how markup is
//! parsed stays behind the trait.

mod hacker_news;

pub use hacker_news::HackerNewsExtractor;

/// One ranked entry on the front page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryEntry {
    /// Story identifier, stable across polls
    pub id: String,

    /// 1-based position on the front page
    pub rank: usize,

    /// Markup of the entry row
    pub markup: String,
}

/// Title and canonical URL of a story
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Headline {
    pub title: String,
    pub url: String,
}

/// Outbound links found in one comment, in document order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentLinks {
    pub comment_id: String,
    pub urls: Vec<String>,
}

impl CommentLinks {
    /// Splits the comment into individually numbered links
    pub fn links(&self) -> impl Iterator<Item = CommentLink> + '_ {
        self.urls
            .iter()
            .enumerate()
            .map(move |(ordinal, url)| CommentLink {
                comment_id: self.comment_id.clone(),
                ordinal,
                url: url.clone(),
            })
    }
}

/// One outbound link of a comment, numbered by its position in the comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentLink {
    pub comment_id: String,
    pub ordinal: usize,
    pub url: String,
}

/// Extracts structured fields from site markup
///
/// Every method tolerates missing or malformed structure and returns an
/// empty result instead of failing.
pub trait ContentExtractor: Send + Sync {
    /// Story entries on the front page, in listing order
    fn story_entries(&self, front_page: &str) -> Vec<StoryEntry>;

    /// Headline from the first title line in `markup`
    fn story_headline(&self, markup: &str) -> Option<Headline>;

    /// Comments that contain outbound links, in document order
    fn comment_links(&self, story_page: &str) -> Vec<CommentLinks>;
}

/// Identifiers become path segments in the archive, so only plain
/// alphanumeric ids are accepted
pub(crate) fn is_valid_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric())
}
