use crate::crawler::ContentKind;
use crate::url::resource_name;

/// Stem used when a title has no usable characters
const UNTITLED: &str = "untitled";

/// Converts a story title into a filesystem-safe `.html` filename
///
/// Every character that is neither alphanumeric nor whitespace becomes an
/// underscore, then leading and trailing underscores and whitespace are
/// trimmed.
///
/// # Example
///
/// ```
/// use ycrawler::archive::make_safe_filename;
///
/// assert_eq!(make_safe_filename("A/B: C?"), "A_B_ C.html");
/// assert_eq!(make_safe_filename("Hello World"), "Hello World.html");
/// ```
pub fn make_safe_filename(text: &str) -> String {
    let replaced: String = text
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() {
                c
            } else {
                '_'
            }
        })
        .collect();

    let stem = replaced.trim_matches(|c: char| c == '_' || c.is_whitespace());
    let stem = if stem.is_empty() { UNTITLED } else { stem };

    format!("{stem}.html")
}

/// Filename for a resource linked from a comment
///
/// HTML resources are stored as `<comment>_<ordinal>.html`. Anything else
/// keeps the remote base filename: `<comment>_<ordinal>_<name>`.
pub fn comment_file_name(comment_id: &str, ordinal: usize, kind: &ContentKind, url: &str) -> String {
    if kind.is_html() {
        format!("{comment_id}_{ordinal}.html")
    } else {
        format!("{comment_id}_{ordinal}_{}", resource_name(url))
    }
}
