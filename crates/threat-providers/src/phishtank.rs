//! PhishTank feed provider (`http://data.phishtank.com/data/online-valid.json.gz`)
//!
//! Gzipped JSON array of records, refreshed every 120 minutes. Only
//! records with `verified == "yes"` are inserted.

use std::collections::HashSet;
use std::io::Read;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use flate2::read::GzDecoder;
use serde::Deserialize;

use crate::error::{ProviderError, ProviderResult};
use crate::list_provider::{FeedFetcher, ListProvider};

const PHISHTANK_FEED: &str = "http://data.phishtank.com/data/online-valid.json.gz";
const USER_AGENT: &str = "phishtank/kt-urlproxy-v0.1";

/// PhishTank's hosted API allows only 75 fetches per 72 hours; 120 minutes
/// keeps us well under that (36 fetches/72h) while staying reasonably
/// fresh. Carried over verbatim from the feed this was distilled from —
/// not a value to casually tighten.
const REFRESH_INTERVAL: Duration = Duration::from_secs(120 * 60);

#[derive(Debug, Deserialize)]
struct PhishTankRecord {
    url: String,
    verified: String,
}

struct PhishTankFetcher;

impl FeedFetcher for PhishTankFetcher {
    fn name(&self) -> &'static str {
        "phishtank"
    }

    fn url(&self) -> &'static str {
        PHISHTANK_FEED
    }

    fn user_agent(&self) -> &'static str {
        USER_AGENT
    }

    fn refresh_interval(&self) -> Duration {
        REFRESH_INTERVAL
    }

    /// PhishTank's rate limiter misattributes IPv6 connections, so fetches
    /// are forced over IPv4 by binding the client's local address to the
    /// IPv4 wildcard.
    fn build_client(&self) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder()
            .local_address(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
            .build()
    }

    fn parse(&self, body: &[u8]) -> ProviderResult<HashSet<String>> {
        let mut decoder = GzDecoder::new(body);
        let mut json = Vec::new();
        decoder
            .read_to_end(&mut json)
            .map_err(|e| ProviderError::Decode(format!("gzip: {e}")))?;

        let records: Vec<PhishTankRecord> =
            serde_json::from_slice(&json).map_err(|e| ProviderError::Decode(format!("json: {e}")))?;

        Ok(records
            .into_iter()
            .filter(|r| r.verified == "yes")
            .map(|r| r.url)
            .collect())
    }
}

/// PhishTank threat provider
pub type PhishTankProvider = ListProvider<PhishTankFetcher>;

/// Build a fresh PhishTank provider, not yet initialized
pub fn phishtank_provider() -> Arc<PhishTankProvider> {
    ListProvider::new(PhishTankFetcher)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::Compression;
    use flate2::write::GzEncoder;

    use super::PhishTankFetcher;
    use crate::list_provider::FeedFetcher;

    fn gzip(json: &str) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(json.as_bytes()).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn only_verified_yes_records_are_kept() {
        let json = r#"[
            {"url": "https://phish.example/a", "verified": "yes"},
            {"url": "https://phish.example/b", "verified": "no"}
        ]"#;
        let set = PhishTankFetcher.parse(&gzip(json)).unwrap();
        assert!(set.contains("https://phish.example/a"));
        assert!(!set.contains("https://phish.example/b"));
    }

    #[test]
    fn malformed_gzip_is_a_decode_error() {
        assert!(PhishTankFetcher.parse(b"not gzip").is_err());
    }
}
