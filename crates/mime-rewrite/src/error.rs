//! Error model for the rewriting pipeline
//!
//! Mirrors the taxonomy in the mail filter's error handling design: a
//! malformed envelope is distinguished from a failure deep inside one MIME
//! part, so the caller can decide whether "pass through unmodified" is safe
//! to do silently or whether the original message should be snapshotted
//! first.

use thiserror::Error;

/// Rewriting pipeline error
///
/// Every variant is non-fatal to the host process: callers convert these
/// into "accept the message unmodified" at the mail-filter boundary.
#[derive(Debug, Error)]
pub enum RewriteError {
    /// The top-level `Content-Type` could not be classified as text,
    /// `multipart/*`, or `application/rtf`
    #[error("unsupported content type: {0}")]
    Unsupported(String),

    /// Multipart nesting exceeded the configured recursion cap
    #[error("multipart recursion exceeded depth {0}")]
    RecursionTooDeep(u8),

    /// A `multipart/*` part declared no `boundary` parameter
    #[error("missing multipart boundary")]
    MissingBoundary,

    /// `Content-Transfer-Encoding` was present but not one of the
    /// supported values
    #[error("unsupported transfer encoding: {0}")]
    UnsupportedTransferEncoding(String),

    /// Base64 payload could not be decoded
    #[error("invalid base64 payload: {0}")]
    InvalidBase64(String),

    /// Quoted-printable payload could not be decoded
    #[error("invalid quoted-printable payload: {0}")]
    InvalidQuotedPrintable(String),

    /// A part's header block could not be parsed
    #[error("invalid part headers: {0}")]
    InvalidHeaders(String),

    /// A rewritable leaf's decoded body was not valid UTF-8, so neither
    /// the URL scanner nor the banner insertion can run over it safely
    #[error("leaf body is not valid UTF-8")]
    NonUtf8LeafBody,
}

/// Result alias used throughout this crate
pub type RewriteResult<T> = Result<T, RewriteError>;
