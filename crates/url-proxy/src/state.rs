//! Shared server state
//!
//! One [`AppState`] is built at startup and cloned (cheaply, via `Arc`)
//! into every request handler. Per §9 Design Notes, the three threat
//! providers are a fixed, known-at-startup set rather than a
//! heterogeneous collection behind a trait object — so this holds three
//! concrete fields, not a `Vec<Box<dyn ThreatProvider>>`.

use std::sync::Arc;

use minijinja::Environment;
use threat_providers::{HostedProvider, PhishTankProvider, ProviderResult, UrlHausProvider};

use crate::templates;

/// Everything a request handler needs, cheaply cloneable
#[derive(Clone)]
pub struct AppState {
    pub urlhaus: Arc<UrlHausProvider>,
    pub phishtank: Arc<PhishTankProvider>,
    pub hosted: Arc<HostedProvider>,
    pub templates: Arc<Environment<'static>>,
    /// This proxy's own external host, used to refuse wrapping a link that
    /// already points back at the interstitial itself
    pub host: Arc<str>,
}

impl AppState {
    pub fn new(
        urlhaus: Arc<UrlHausProvider>,
        phishtank: Arc<PhishTankProvider>,
        hosted: Arc<HostedProvider>,
        host: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            urlhaus,
            phishtank,
            hosted,
            templates: Arc::new(templates::environment()),
            host: host.into(),
        }
    }

    /// Initialize every provider, eagerly and in sequence, matching the
    /// order they are consulted by [`Self::is_threat`]. If any initial
    /// fetch fails the whole startup fails — a handler must never come up
    /// with a provider that has no populated snapshot.
    pub async fn init_all(&self) -> ProviderResult<()> {
        Arc::clone(&self.urlhaus).init().await?;
        Arc::clone(&self.phishtank).init().await?;
        Arc::clone(&self.hosted).init().await?;
        Ok(())
    }

    /// Signal every provider's refresh loop to stop and wait for it to
    /// actually exit before returning.
    pub async fn shutdown_all(&self) {
        if let Err(e) = Arc::clone(&self.urlhaus).shutdown().await {
            tracing::warn!(provider = "urlhaus", error = %e, "shutdown failed");
        }
        if let Err(e) = Arc::clone(&self.phishtank).shutdown().await {
            tracing::warn!(provider = "phishtank", error = %e, "shutdown failed");
        }
        if let Err(e) = Arc::clone(&self.hosted).shutdown().await {
            tracing::warn!(provider = "hosted", error = %e, "shutdown failed");
        }
    }

    /// OR-reduce every provider's verdict for `url`. The first provider
    /// error aborts the fan-out; callers map that to a `5xx` without
    /// disclosing the checked URL.
    pub async fn is_threat(&self, url: &str) -> ProviderResult<bool> {
        let urlhaus_hit = self.urlhaus.check(url)?;
        let phishtank_hit = self.phishtank.check(url)?;
        let hosted_hit = self.hosted.check(url).await?;
        Ok(urlhaus_hit || phishtank_hit || hosted_hit)
    }
}
