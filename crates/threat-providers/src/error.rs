//! Error model for threat reputation providers

use thiserror::Error;

/// Errors a threat provider can surface to its caller
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The initial synchronous fetch at `init` failed; the provider must
    /// not come up without a populated list
    #[error("initial fetch failed: {0}")]
    InitialFetchFailed(String),

    /// A background refresh fetch failed; the previous snapshot is kept
    #[error("refresh fetch failed: {0}")]
    RefreshFailed(String),

    /// The feed response could not be parsed into the expected format
    #[error("feed decode failed: {0}")]
    Decode(String),

    /// `Check` was called outside `Ready`/`Refreshing`
    #[error("provider not ready: {0}")]
    NotReady(String),

    /// A hosted lookup client failed
    #[error("hosted lookup failed: {0}")]
    HostedLookup(String),
}

/// Result alias used throughout this crate
pub type ProviderResult<T> = Result<T, ProviderError>;
