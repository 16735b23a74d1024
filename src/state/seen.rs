use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Summary of a story that has been archived
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeenEntry {
    /// Story title as shown on the site
    pub title: String,

    /// Canonical URL the story points to
    pub url: String,

    /// When the story's detail page was archived
    pub archived_at: DateTime<Utc>,
}

/// Record of the stories archived during this process
///
/// Entries are only ever added. Once an identifier is present the crawl loop
/// never dispatches that story again.
#[derive(Debug, Clone, Default)]
pub struct SeenSet {
    entries: HashMap<String, SeenEntry>,

    /// Identifiers in insertion order
    order: Vec<String>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, story_id: &str) -> bool {
        self.entries.contains_key(story_id)
    }

    pub fn get(&self, story_id: &str) -> Option<&SeenEntry> {
        self.entries.get(story_id)
    }

    /// Records a story. Returns false, leaving the first entry in place, if
    /// the identifier was already present.
    pub fn insert(&mut self, story_id: impl Into<String>, entry: SeenEntry) -> bool {
        let story_id = story_id.into();
        if self.entries.contains_key(&story_id) {
            return false;
        }
        self.order.push(story_id.clone());
        self.entries.insert(story_id, entry);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the recorded stories in the order they were archived
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SeenEntry)> {
        self.order
            .iter()
            .filter_map(|id| self.entries.get(id).map(|entry| (id.as_str(), entry)))
    }
}
