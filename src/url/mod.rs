//! URL helpers for the crawler
//!
//! This module builds story detail URLs, resolves links found in markup
//! against the site, and derives resource filenames from URLs.

mod link;

pub use link::{resolve_link, resource_name};

use url::Url;

/// Builds the detail page URL of a story: `<site>/item?id=<id>`
///
/// # Example
///
/// ```
/// use url::Url;
/// use ycrawler::url::item_url;
///
/// let site = Url::parse("https://news.ycombinator.com").unwrap();
/// let url = item_url(&site, "123").unwrap();
/// assert_eq!(url.as_str(), "https://news.ycombinator.com/item?id=123");
/// ```
pub fn item_url(site: &Url, story_id: &str) -> Result<Url, url::ParseError> {
    let mut url = site.join("item")?;
    url.query_pairs_mut().clear().append_pair("id", story_id);
    Ok(url)
}
