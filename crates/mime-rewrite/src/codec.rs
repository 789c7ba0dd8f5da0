//! Content-Transfer-Encoding codec (RFC 2045)
//!
//! Covers the encodings a MIME leaf part may declare. Identity encodings
//! pass through untouched; `base64` and `quoted-printable` are decoded and
//! re-encoded losslessly enough to survive a rewrite round trip.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;

use crate::error::{RewriteError, RewriteResult};
use crate::linesplitter;

/// Base64 line length per RFC 2045 §6.8
const BASE64_LINE_LEN: usize = 76;

/// Decode a leaf body for the given `Content-Transfer-Encoding` value
///
/// The encoding is matched case-insensitively; an absent header is treated
/// as `7bit` by the caller before this function is invoked.
pub fn decode(body: &[u8], encoding: &str) -> RewriteResult<Vec<u8>> {
    match encoding.to_ascii_lowercase().as_str() {
        "" | "7bit" | "8bit" | "binary" => Ok(body.to_vec()),
        "base64" => decode_base64(body),
        "quoted-printable" => decode_quoted_printable(body),
        other => Err(RewriteError::UnsupportedTransferEncoding(other.to_owned())),
    }
}

/// Encode a rewritten leaf body back into the given transfer encoding
pub fn encode(body: &[u8], encoding: &str) -> RewriteResult<Vec<u8>> {
    match encoding.to_ascii_lowercase().as_str() {
        "" | "7bit" | "8bit" | "binary" => Ok(body.to_vec()),
        "base64" => Ok(encode_base64(body)),
        "quoted-printable" => Ok(encode_quoted_printable(body)),
        other => Err(RewriteError::UnsupportedTransferEncoding(other.to_owned())),
    }
}

/// Decode base64, tolerating embedded whitespace/line breaks
fn decode_base64(body: &[u8]) -> RewriteResult<Vec<u8>> {
    let stripped: Vec<u8> = body
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    BASE64_STANDARD
        .decode(stripped)
        .map_err(|e| RewriteError::InvalidBase64(e.to_string()))
}

/// Encode to base64, wrapped at 76 characters per line with CRLF
fn encode_base64(body: &[u8]) -> Vec<u8> {
    let encoded = BASE64_STANDARD.encode(body);
    linesplitter::wrap(encoded.as_bytes(), BASE64_LINE_LEN, b"\r\n")
}

/// Decode quoted-printable per RFC 2045 §6.7
fn decode_quoted_printable(body: &[u8]) -> RewriteResult<Vec<u8>> {
    quoted_printable::decode(body, quoted_printable::ParseMode::Robust)
        .map_err(|e| RewriteError::InvalidQuotedPrintable(format!("{e:?}")))
}

/// Encode quoted-printable per RFC 2045 §6.7
fn encode_quoted_printable(body: &[u8]) -> Vec<u8> {
    quoted_printable::encode(body)
}
