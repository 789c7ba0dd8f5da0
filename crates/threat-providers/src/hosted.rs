//! Hosted Safe-Browsing-style reputation provider
//!
//! Delegates `Check` to a hosted reputation API rather than owning a
//! locally refreshed set. `Init` blocks until the client reports its
//! local cache is ready; `Shutdown` closes it. The actual wire client is
//! treated as an external collaborator (per scope, the hosted
//! threat-lookup client itself is out of bounds) — this wraps whatever
//! HTTP-based lookup client is configured behind the same three-verb
//! capability every other provider exposes.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::error::{ProviderError, ProviderResult};
use crate::state::{ProviderState, StateCell};

/// Hosted reputation API base URL
const LOOKUP_ENDPOINT: &str = "https://safebrowsing.googleapis.com/v4/threatMatches:find";

#[derive(Debug, Deserialize, Default)]
struct ThreatMatchesResponse {
    #[serde(default)]
    matches: Vec<serde_json::Value>,
}

/// Hosted (third-party API-backed) threat provider
///
/// Unlike [`crate::list_provider::ListProvider`], this holds no background
/// refresh task: each `Check` call is a live (but typically cache-hit)
/// request against the hosted client.
pub struct HostedProvider {
    api_key: String,
    client: Client,
    state: StateCell,
}

impl HostedProvider {
    pub fn new(api_key: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            api_key: api_key.into(),
            client: Client::new(),
            state: StateCell::new(),
        })
    }

    /// Mark the hosted client ready to serve `Check` calls
    ///
    /// The vendored Go client this was ported from (`provider-sb.go`)
    /// wraps a Safe Browsing client library with its own local threat-list
    /// cache, so its `Init` blocks on `WaitUntilReady`. This provider talks
    /// to the hosted `threatMatches:find` REST endpoint directly instead
    /// (see `DESIGN.md`) and keeps no local cache of its own, so there is
    /// nothing to wait on here beyond the state transition itself — each
    /// `Check` call is already a live request.
    pub async fn init(self: Arc<Self>) -> ProviderResult<()> {
        self.state.set(ProviderState::Initializing);
        self.state.set(ProviderState::Ready);
        Ok(())
    }

    pub async fn shutdown(self: Arc<Self>) -> ProviderResult<()> {
        self.state.set(ProviderState::ShuttingDown);
        self.state.set(ProviderState::Terminated);
        Ok(())
    }

    pub async fn check(&self, candidate: &str) -> ProviderResult<bool> {
        if !self.state.get().accepts_check() {
            return Err(ProviderError::NotReady("hosted".to_string()));
        }

        let body = serde_json::json!({
            "client": {"clientId": "kt-urlproxy", "clientVersion": "0.1"},
            "threatInfo": {
                "threatTypes": ["MALWARE", "SOCIAL_ENGINEERING"],
                "platformTypes": ["ANY_PLATFORM"],
                "threatEntryTypes": ["URL"],
                "threatEntries": [{"url": candidate}],
            }
        });

        let response = self
            .client
            .post(LOOKUP_ENDPOINT)
            .query(&[("key", self.api_key.as_str())])
            .timeout(Duration::from_secs(10))
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::HostedLookup(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::HostedLookup(format!(
                "unexpected status {}",
                response.status()
            )));
        }

        let parsed: ThreatMatchesResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::HostedLookup(e.to_string()))?;

        Ok(!parsed.matches.is_empty())
    }
}
