//! `GET /check/<b64url>` — decode, fan out to every provider, render
//!
//! Client input errors (missing segment, bad encoding, unparseable URL)
//! map to `4xx` with a short message. A provider error maps to a generic
//! `5xx`; the decoded URL is never reflected into an error response body,
//! matching the fail-closed-with-retry policy at this boundary.

use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse, Response};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::error::ProxyError;
use crate::state::AppState;

/// `GET /check/` with no trailing segment
pub async fn missing_url() -> ProxyError {
    ProxyError::MissingUrl
}

/// `GET /check/<encoded>`
pub async fn check(State(state): State<AppState>, Path(encoded): Path<String>) -> Response {
    match check_inner(&state, &encoded).await {
        Ok(html) => Html(html).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn check_inner(state: &AppState, encoded: &str) -> Result<String, ProxyError> {
    if encoded.is_empty() {
        return Err(ProxyError::MissingUrl);
    }

    let decoded = URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|_| ProxyError::InvalidEncoding)?;
    let decoded = String::from_utf8(decoded).map_err(|_| ProxyError::InvalidUrl)?;
    let parsed = url::Url::parse(&decoded).map_err(|_| ProxyError::InvalidUrl)?;

    if parsed
        .host_str()
        .is_some_and(|h| h.eq_ignore_ascii_case(&state.host))
    {
        return Err(ProxyError::InvalidUrl);
    }

    let threat = state
        .is_threat(parsed.as_str())
        .await
        .map_err(|e| ProxyError::ProviderCheckFailed(e.to_string()))?;

    Ok(if threat {
        crate::templates::render_block(&state.templates, parsed.as_str())
    } else {
        crate::templates::render_confirmation(&state.templates, parsed.as_str())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use threat_providers::{HostedProvider, phishtank_provider, urlhaus_provider};

    fn test_state() -> AppState {
        AppState::new(
            urlhaus_provider(),
            phishtank_provider(),
            HostedProvider::new("test-key"),
            "urlcheck.example.com",
        )
    }

    #[tokio::test]
    async fn empty_segment_is_missing_url() {
        let err = check_inner(&test_state(), "").await.unwrap_err();
        assert!(matches!(err, ProxyError::MissingUrl));
    }

    #[tokio::test]
    async fn non_base64url_segment_is_invalid_encoding() {
        let err = check_inner(&test_state(), "not valid base64!!").await.unwrap_err();
        assert!(matches!(err, ProxyError::InvalidEncoding));
    }

    #[tokio::test]
    async fn non_url_payload_is_invalid_url() {
        let encoded = URL_SAFE_NO_PAD.encode(b"not a url");
        let err = check_inner(&test_state(), &encoded).await.unwrap_err();
        assert!(matches!(err, ProxyError::InvalidUrl));
    }

    #[tokio::test]
    async fn uninitialized_providers_surface_as_provider_check_failed() {
        let encoded = URL_SAFE_NO_PAD.encode(b"https://example.com/x");
        let err = check_inner(&test_state(), &encoded).await.unwrap_err();
        assert!(matches!(err, ProxyError::ProviderCheckFailed(_)));
    }

    #[tokio::test]
    async fn a_link_pointing_back_at_the_proxy_itself_is_rejected() {
        let encoded = URL_SAFE_NO_PAD.encode(b"https://urlcheck.example.com/check/whatever");
        let err = check_inner(&test_state(), &encoded).await.unwrap_err();
        assert!(matches!(err, ProxyError::InvalidUrl));
    }
}
