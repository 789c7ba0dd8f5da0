//! Threat reputation providers
//!
//! Three feeds, one shared capability: `Init`, `Shutdown`, `Check(url)`.
//! Two are list-backed (URLhaus, PhishTank) and share the
//! [`list_provider::ListProvider`] skeleton; the third
//! ([`hosted::HostedProvider`]) delegates to a hosted API. The proxy holds
//! a fixed set of all three rather than a heterogeneous collection — the
//! set is known at startup and never extended, so there is no trait
//! object here, just three concrete types.

pub mod error;
pub mod hosted;
pub mod list_provider;
pub mod phishtank;
pub mod state;
pub mod urlhaus;

pub use error::{ProviderError, ProviderResult};
pub use hosted::HostedProvider;
pub use list_provider::{FeedFetcher, ListProvider, MAX_FEED_BYTES};
pub use phishtank::{PhishTankProvider, phishtank_provider};
pub use state::ProviderState;
pub use urlhaus::{UrlHausProvider, urlhaus_provider};
