//! Generic list-backed provider skeleton
//!
//! Shared by every provider whose threat data is "download a feed, parse
//! it into a set, swap it in." Each concrete provider supplies a
//! [`FeedFetcher`]; this module owns the snapshot concurrency, the
//! background refresh loop, and the size-capped HTTP fetch.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::USER_AGENT;

use crate::error::{ProviderError, ProviderResult};
use crate::state::{ProviderState, StateCell};

/// Feed responses are capped at this many bytes to bound memory use
pub const MAX_FEED_BYTES: usize = 50 * 1024 * 1024;

/// Feed-specific behavior a [`ListProvider`] needs: where to fetch from,
/// on what cadence, and how to turn a capped response body into a set of
/// threat strings.
pub trait FeedFetcher: Send + Sync + 'static {
    /// Name used in log lines
    fn name(&self) -> &'static str;

    /// Feed URL
    fn url(&self) -> &'static str;

    /// `User-Agent` sent with every fetch
    fn user_agent(&self) -> &'static str;

    /// How often the background task refreshes the snapshot
    fn refresh_interval(&self) -> Duration;

    /// Build the HTTP client used for fetches. Most feeds can use the
    /// default; a feed whose upstream needs a non-default transport (see
    /// [`crate::phishtank`]) overrides this.
    fn build_client(&self) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder().build()
    }

    /// Parse a (possibly truncated) response body into the in-memory set
    fn parse(&self, body: &[u8]) -> ProviderResult<HashSet<String>>;
}

/// A threat-list provider backed by a periodically refreshed feed
pub struct ListProvider<F: FeedFetcher> {
    fetcher: F,
    snapshot: RwLock<Arc<HashSet<String>>>,
    state: StateCell,
    shutdown_tx: Mutex<Option<tokio::sync::watch::Sender<bool>>>,
    refresh_handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl<F: FeedFetcher> ListProvider<F> {
    pub fn new(fetcher: F) -> Arc<Self> {
        Arc::new(Self {
            fetcher,
            snapshot: RwLock::new(Arc::new(HashSet::new())),
            state: StateCell::new(),
            shutdown_tx: Mutex::new(None),
            refresh_handle: Mutex::new(None),
        })
    }

    /// Perform the first, synchronous fetch and start the background
    /// refresh loop. Returns an error (leaving the provider
    /// `Uninitialized`) if the initial fetch fails — per the list-provider
    /// contract, the handler must not come up without a populated list.
    pub async fn init(self: Arc<Self>) -> ProviderResult<()> {
        self.state.set(ProviderState::Initializing);

        let initial = self
            .fetch_once()
            .await
            .map_err(|e| ProviderError::InitialFetchFailed(e.to_string()))?;
        tracing::info!(provider = self.fetcher.name(), entries = initial.len(), "initial fetch complete");
        *self.snapshot.write().expect("snapshot lock poisoned") = Arc::new(initial);
        self.state.set(ProviderState::Ready);

        let (tx, mut shutdown_rx) = tokio::sync::watch::channel(false);
        *self.shutdown_tx.lock().expect("shutdown_tx lock poisoned") = Some(tx);

        let this = Arc::clone(&self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(this.fetcher.refresh_interval());
            ticker.tick().await; // first tick is immediate; init already populated the snapshot

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        this.state.set(ProviderState::Refreshing);
                        match this.fetch_once().await {
                            Ok(set) => {
                                tracing::info!(provider = this.fetcher.name(), entries = set.len(), "refresh complete");
                                *this.snapshot.write().expect("snapshot lock poisoned") = Arc::new(set);
                            }
                            Err(e) => {
                                tracing::warn!(provider = this.fetcher.name(), error = %e, "refresh failed, retaining previous snapshot");
                            }
                        }
                        this.state.set(ProviderState::Ready);
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
        });
        *self.refresh_handle.lock().expect("refresh_handle lock poisoned") = Some(handle);

        Ok(())
    }

    /// Signal the refresh loop to exit and wait for it to actually stop
    pub async fn shutdown(self: Arc<Self>) -> ProviderResult<()> {
        self.state.set(ProviderState::ShuttingDown);
        if let Some(tx) = self.shutdown_tx.lock().expect("shutdown_tx lock poisoned").take() {
            let _ = tx.send(true);
        }
        if let Some(handle) = self.refresh_handle.lock().expect("refresh_handle lock poisoned").take() {
            let _ = handle.await;
        }
        self.state.set(ProviderState::Terminated);
        Ok(())
    }

    /// Exact-string lookup against the current snapshot
    ///
    /// Takes the read lock only long enough to clone the snapshot `Arc`;
    /// the actual hash lookup happens on that clone, so a concurrent
    /// refresh swap can never stall this for longer than an O(1) pointer
    /// read.
    pub fn check(&self, candidate: &str) -> ProviderResult<bool> {
        if !self.state.get().accepts_check() {
            return Err(ProviderError::NotReady(self.fetcher.name().to_string()));
        }
        let snapshot = Arc::clone(&self.snapshot.read().expect("snapshot lock poisoned"));
        Ok(snapshot.contains(candidate))
    }

    async fn fetch_once(&self) -> ProviderResult<HashSet<String>> {
        let client = self
            .fetcher
            .build_client()
            .map_err(|e| ProviderError::RefreshFailed(e.to_string()))?;

        let response = client
            .get(self.fetcher.url())
            .header(USER_AGENT, self.fetcher.user_agent())
            .send()
            .await
            .map_err(|e| ProviderError::RefreshFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::RefreshFailed(format!(
                "unexpected status {}",
                response.status()
            )));
        }

        let body = read_capped(response, MAX_FEED_BYTES)
            .await
            .map_err(|e| ProviderError::RefreshFailed(e.to_string()))?;

        self.fetcher.parse(&body)
    }
}

/// Read a response body, discarding any bytes past `limit` without ever
/// buffering more than `limit` bytes at once. A feed's declared or actual
/// size plays no part in the decision, only the bytes actually read do, so
/// a feed that lies about `Content-Length` (or omits it, forcing chunked
/// transfer) can't force an unbounded allocation here.
async fn read_capped(response: reqwest::Response, limit: usize) -> reqwest::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut stream = response.bytes_stream();
    while buf.len() < limit {
        let Some(chunk) = stream.next().await else {
            break;
        };
        let chunk = chunk?;
        let remaining = limit - buf.len();
        if chunk.len() <= remaining {
            buf.extend_from_slice(&chunk);
        } else {
            buf.extend_from_slice(&chunk[..remaining]);
            break;
        }
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::time::Duration;

    use super::{FeedFetcher, ListProvider, ProviderResult};

    struct StaticFetcher {
        entries: Vec<&'static str>,
    }

    impl FeedFetcher for StaticFetcher {
        fn name(&self) -> &'static str {
            "static-test-fetcher"
        }
        fn url(&self) -> &'static str {
            "http://127.0.0.1:0/unused"
        }
        fn user_agent(&self) -> &'static str {
            "test/0.1"
        }
        fn refresh_interval(&self) -> Duration {
            Duration::from_secs(3600)
        }
        fn parse(&self, _body: &[u8]) -> ProviderResult<HashSet<String>> {
            Ok(self.entries.iter().map(|s| s.to_string()).collect())
        }
    }

    #[test]
    fn check_before_init_is_not_ready() {
        let provider = ListProvider::new(StaticFetcher { entries: vec!["https://bad.example/x"] });
        assert!(provider.check("https://bad.example/x").is_err());
    }

    #[tokio::test]
    async fn read_capped_never_buffers_past_the_limit() {
        let body = "x".repeat(1024);
        let mut server = mockito::Server::new_async().await;
        let _mock = server.mock("GET", "/feed").with_status(200).with_body(&body).create_async().await;

        let response = reqwest::Client::new()
            .get(format!("{}/feed", server.url()))
            .send()
            .await
            .unwrap();

        let capped = super::read_capped(response, 100).await.unwrap();
        assert_eq!(capped.len(), 100);
        assert_eq!(capped, vec![b'x'; 100]);
    }

    #[tokio::test]
    async fn read_capped_returns_the_whole_body_when_under_the_limit() {
        let mut server = mockito::Server::new_async().await;
        let _mock =
            server.mock("GET", "/feed").with_status(200).with_body("short body").create_async().await;

        let response = reqwest::Client::new()
            .get(format!("{}/feed", server.url()))
            .send()
            .await
            .unwrap();

        let capped = super::read_capped(response, super::MAX_FEED_BYTES).await.unwrap();
        assert_eq!(capped, b"short body");
    }
}
