//! URLhaus feed provider (`https://urlhaus.abuse.ch/downloads/text/`)
//!
//! Plain text, one URL per line, refreshed every 10 minutes.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ProviderResult;
use crate::list_provider::{FeedFetcher, ListProvider};

const URLHAUS_FEED: &str = "https://urlhaus.abuse.ch/downloads/text/";
const USER_AGENT: &str = "kt-urlproxy/v0.1";
const REFRESH_INTERVAL: Duration = Duration::from_secs(10 * 60);

struct UrlHausFetcher;

impl FeedFetcher for UrlHausFetcher {
    fn name(&self) -> &'static str {
        "urlhaus"
    }

    fn url(&self) -> &'static str {
        URLHAUS_FEED
    }

    fn user_agent(&self) -> &'static str {
        USER_AGENT
    }

    fn refresh_interval(&self) -> Duration {
        REFRESH_INTERVAL
    }

    fn parse(&self, body: &[u8]) -> ProviderResult<HashSet<String>> {
        let text = String::from_utf8_lossy(body);
        Ok(text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect())
    }
}

/// URLhaus threat provider
pub type UrlHausProvider = ListProvider<UrlHausFetcher>;

/// Build a fresh URLhaus provider, not yet initialized
pub fn urlhaus_provider() -> Arc<UrlHausProvider> {
    ListProvider::new(UrlHausFetcher)
}

#[cfg(test)]
mod tests {
    use super::UrlHausFetcher;
    use crate::list_provider::FeedFetcher;

    #[test]
    fn parses_one_url_per_line_trimming_whitespace() {
        let fetcher = UrlHausFetcher;
        let set = fetcher
            .parse(b"https://bad.example/a\r\n  https://bad.example/b  \n\nhttps://bad.example/c")
            .unwrap();
        assert!(set.contains("https://bad.example/a"));
        assert!(set.contains("https://bad.example/b"));
        assert!(set.contains("https://bad.example/c"));
    }

    #[test]
    fn skips_blank_lines_and_comment_header() {
        let fetcher = UrlHausFetcher;
        let set = fetcher
            .parse(b"# URLhaus feed\r\n\r\nhttps://bad.example/a\r\n")
            .unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.contains("https://bad.example/a"));
    }
}
