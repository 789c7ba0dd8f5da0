//! Strict URL scanner
//!
//! Finds URL-shaped substrings that carry an explicit scheme (`scheme://`
//! or `cid:`); a bare `example.com` is never matched. This is a
//! schema-anchored "strict" scan, implemented with `regex` rather than a
//! bare/scheme-optional scanner.

use std::sync::LazyLock;

use regex::Regex;

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:[a-z][a-z0-9+.-]*://[^\s<>"'\)\]]+|cid:[^\s<>"'\)\]]+)"#)
        .expect("url scanner pattern is valid")
});

/// Trailing characters that are almost never part of the URL itself when
/// they close out a sentence or an enclosing bracket pair
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', '\'', '"'];

/// One match of [`find_urls`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlMatch {
    /// Byte offset of the match start within the scanned text
    pub start: usize,
    /// Byte offset one past the match end
    pub end: usize,
    /// The matched text itself
    pub text: String,
}

/// Find every strictly-scheme-qualified URL-like substring in `text`
///
/// Trailing sentence punctuation is trimmed off each match so that
/// `"see https://example.com/x."` yields `https://example.com/x` rather
/// than swallowing the final period.
pub fn find_urls(text: &str) -> Vec<UrlMatch> {
    URL_PATTERN
        .find_iter(text)
        .map(|m| {
            let raw = m.as_str();
            let trimmed_len = raw.trim_end_matches(TRAILING_PUNCTUATION).len();
            UrlMatch {
                start: m.start(),
                end: m.start() + trimmed_len,
                text: raw[..trimmed_len].to_string(),
            }
        })
        .filter(|m| !m.text.is_empty())
        .collect()
}

/// Replace every matched URL in `text` using `replacer`, leaving
/// non-matching text untouched
pub fn replace_all(text: &str, mut replacer: impl FnMut(&str) -> String) -> String {
    let matches = find_urls(text);
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for m in matches {
        out.push_str(&text[last..m.start]);
        out.push_str(&replacer(&m.text));
        last = m.end;
    }
    out.push_str(&text[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::{find_urls, replace_all};

    #[test]
    fn matches_scheme_qualified_urls_only() {
        let matches = find_urls("visit example.com or https://example.com/x today");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].text, "https://example.com/x");
    }

    #[test]
    fn matches_cid_references() {
        let matches = find_urls("see <img src=cid:part1.jpg@example>");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].text, "cid:part1.jpg@example");
    }

    #[test]
    fn trims_trailing_sentence_punctuation() {
        let matches = find_urls("Hello see https://evil.example/x.");
        assert_eq!(matches[0].text, "https://evil.example/x");
    }

    #[test]
    fn replace_all_preserves_surrounding_text() {
        let out = replace_all("Hello see https://evil.example/x", |_| "WRAPPED".to_string());
        assert_eq!(out, "Hello see WRAPPED");
    }

    #[test]
    fn replace_all_handles_multiple_matches() {
        let out = replace_all("a https://one/ b https://two/ c", |m| format!("[{m}]"));
        assert_eq!(out, "a [https://one/] b [https://two/] c");
    }
}
