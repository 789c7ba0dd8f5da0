//! Error model for the URL proxy's HTTP boundary
//!
//! Every variant maps to an HTTP response via [`ProxyError::into_response`];
//! none of them ever echo the decoded URL back into an error body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProxyError {
    /// The `/check/` path carried no encoded segment
    #[error("missing url")]
    MissingUrl,

    /// The path segment did not decode as base64url
    #[error("invalid url encoding")]
    InvalidEncoding,

    /// Decoded bytes did not parse as a URL
    #[error("invalid url")]
    InvalidUrl,

    /// A threat provider returned an error while checking the URL
    #[error("provider check failed: {0}")]
    ProviderCheckFailed(String),

    /// A configured environment variable was missing or malformed
    #[error("configuration error: {0}")]
    Config(String),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::MissingUrl => (StatusCode::BAD_REQUEST, self.to_string()),
            Self::InvalidEncoding => (StatusCode::BAD_REQUEST, self.to_string()),
            Self::InvalidUrl => (StatusCode::BAD_REQUEST, self.to_string()),
            Self::ProviderCheckFailed(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error, please try again later".to_string(),
            ),
            Self::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string()),
        };
        (status, message).into_response()
    }
}

pub type ProxyResult<T> = Result<T, ProxyError>;
