//! Site matching against the blocklist.
//!
//! Matching is by hostname: an entry covers its own host and every
//! subdomain of it. URLs that do not parse never match.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

#[allow(clippy::expect_used)]
static ENTRY_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(https?://)?(www\.)?").expect("invalid regex"));

#[allow(clippy::expect_used)]
static DOMAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([a-z0-9-]*[a-z0-9])?(\.[a-z0-9]([a-z0-9-]*[a-z0-9])?)*\.[a-z]{2,}$")
        .expect("invalid regex")
});

/// Whether `url` is on a blocked site.
///
/// ```
/// use mindful_gate::site::matches;
///
/// let blocklist = vec!["reddit.com".to_string()];
/// assert!(matches("https://old.reddit.com/r/rust", &blocklist));
/// assert!(!matches("https://notreddit.com/", &blocklist));
/// assert!(!matches("not a url", &blocklist));
/// ```
#[must_use]
pub fn matches(url: &str, blocklist: &[String]) -> bool {
    matched_entry(url, blocklist).is_some()
}

/// The first blocklist entry covering `url`, as written in the blocklist.
#[must_use]
pub fn matched_entry<'a>(url: &str, blocklist: &'a [String]) -> Option<&'a str> {
    let host = hostname(url)?;
    matched_entry_for_host(&host, blocklist)
}

/// The first blocklist entry covering `host`.
#[must_use]
pub fn matched_entry_for_host<'a>(host: &str, blocklist: &'a [String]) -> Option<&'a str> {
    let host = host.to_lowercase();
    blocklist
        .iter()
        .find(|entry| {
            let clean = clean_entry(entry);
            !clean.is_empty()
                && (host == clean
                    || host
                        .strip_suffix(clean.as_str())
                        .is_some_and(|rest| rest.ends_with('.')))
        })
        .map(String::as_str)
}

/// Lower-cased hostname of `url`, or `None` if it does not parse or has no host.
#[must_use]
pub fn hostname(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()?
        .host_str()
        .filter(|h| !h.is_empty())
        .map(str::to_lowercase)
}

/// Hostname without a leading `www.`, for display on the barrier.
#[must_use]
pub fn display_name(url: &str) -> Option<String> {
    hostname(url).map(|h| h.strip_prefix("www.").map_or_else(|| h.clone(), str::to_owned))
}

/// Blocklist entry with scheme and leading `www.` removed, lower-cased.
#[must_use]
pub fn clean_entry(entry: &str) -> String {
    ENTRY_PREFIX_RE
        .replace(&entry.to_lowercase(), "")
        .into_owned()
}

/// Normalize user input into a blocklist entry: trim, lower-case, then strip
/// scheme, leading `www.` and trailing slashes.
#[must_use]
pub fn normalize_site(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    ENTRY_PREFIX_RE
        .replace(&lowered, "")
        .trim_end_matches('/')
        .to_owned()
}

/// Whether `site` looks like a registrable domain (`reddit.com`,
/// `news.ycombinator.com`). Expects normalized input.
#[must_use]
pub fn is_valid_domain(site: &str) -> bool {
    DOMAIN_RE.is_match(site)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_exact_and_subdomain_match() {
        let blocklist = list(&["reddit.com"]);
        assert!(matches("https://reddit.com/", &blocklist));
        assert!(matches("https://www.reddit.com/r/all", &blocklist));
        assert!(matches("http://old.reddit.com", &blocklist));
        assert!(matches("https://REDDIT.COM/", &blocklist));
    }

    #[test]
    fn test_suffix_without_dot_does_not_match() {
        let blocklist = list(&["x.com"]);
        assert!(!matches("https://box.com/", &blocklist));
        assert!(!matches("https://x.com.evil.net/", &blocklist));
        assert!(matches("https://mobile.x.com/", &blocklist));
    }

    #[test]
    fn test_entries_are_cleaned() {
        let blocklist = list(&["https://www.Facebook.com"]);
        assert!(matches("https://facebook.com/feed", &blocklist));
        assert!(matches("https://m.facebook.com/", &blocklist));
    }

    #[test]
    fn test_malformed_url_never_matches() {
        let blocklist = list(&["reddit.com"]);
        assert!(!matches("", &blocklist));
        assert!(!matches("reddit.com", &blocklist));
        assert!(!matches("http://", &blocklist));
        assert!(!matches("data:text/plain,reddit.com", &blocklist));
    }

    #[test]
    fn test_empty_blocklist_or_entry() {
        assert!(!matches("https://reddit.com/", &[]));
        assert!(!matches("https://reddit.com/", &list(&["", "www."])));
    }

    #[test]
    fn test_matched_entry_is_first_match() {
        let blocklist = list(&["twitter.com", "reddit.com", "old.reddit.com"]);
        assert_eq!(
            matched_entry("https://old.reddit.com/", &blocklist),
            Some("reddit.com")
        );
        assert_eq!(matched_entry("https://example.org/", &blocklist), None);
    }

    #[test]
    fn test_display_name() {
        assert_eq!(
            display_name("https://www.reddit.com/r/rust").as_deref(),
            Some("reddit.com")
        );
        assert_eq!(
            display_name("https://old.reddit.com/").as_deref(),
            Some("old.reddit.com")
        );
        assert_eq!(display_name("nope"), None);
    }

    #[test]
    fn test_normalize_site() {
        assert_eq!(normalize_site("  HTTPS://www.Reddit.com/// "), "reddit.com");
        assert_eq!(normalize_site("news.ycombinator.com"), "news.ycombinator.com");
        assert_eq!(normalize_site("http://"), "");
    }

    #[test]
    fn test_domain_shape() {
        assert!(is_valid_domain("reddit.com"));
        assert!(is_valid_domain("news.ycombinator.com"));
        assert!(is_valid_domain("my-site.co.uk"));
        assert!(!is_valid_domain("localhost"));
        assert!(!is_valid_domain("-bad.com"));
        assert!(!is_valid_domain("reddit.c"));
        assert!(!is_valid_domain("reddit.com/r/rust"));
    }
}
