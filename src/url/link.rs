use url::Url;

/// Fallback name for resources whose URL has neither a path segment nor a host
const DEFAULT_RESOURCE_NAME: &str = "resource";

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url.to_string())
            } else {
                None
            }
        }
        Err(_) => None,
    }
}

/// Returns the base filename of a remote resource
///
/// The name is the last non-empty path segment with the query string left
/// out. URLs without a usable segment fall back to the host name.
///
/// # Example
///
/// ```
/// use ycrawler::url::resource_name;
///
/// assert_eq!(resource_name("https://x.org/papers/a.pdf?dl=1"), "a.pdf");
/// assert_eq!(resource_name("https://x.org/"), "x.org");
/// ```
pub fn resource_name(url_str: &str) -> String {
    let Ok(url) = Url::parse(url_str) else {
        return fallback_name(url_str);
    };

    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(str::to_string)
        .or_else(|| url.host_str().map(str::to_string))
        .unwrap_or_else(|| DEFAULT_RESOURCE_NAME.to_string())
}

/// Best-effort name for strings that do not parse as URLs
fn fallback_name(raw: &str) -> String {
    let without_query = raw.split(['?', '#']).next().unwrap_or_default();
    without_query
        .rsplit('/')
        .find(|s| !s.is_empty() && *s != "." && *s != "..")
        .map(str::to_string)
        .unwrap_or_else(|| DEFAULT_RESOURCE_NAME.to_string())
}
