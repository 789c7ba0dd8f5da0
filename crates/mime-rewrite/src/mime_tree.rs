//! Minimal MIME part tree: parse and reserialize, byte-for-byte where we
//! don't touch anything
//!
//! `mailparse` gives us a read-only view but no serializer, and we need to
//! splice rewritten leaf bodies back into an otherwise-untouched structure
//! without reflowing anything we didn't change. This is a small,
//! purpose-built parser/writer pair: header folding is preserved verbatim,
//! the boundary string is never altered, and the line-ending convention
//! observed in each part's header block is reused when writing it back.
//! Non-goal: no RFC 5322 validation. Malformed input that can't be split
//! on its declared boundary is surfaced as [`RewriteError::MissingBoundary`].

use crate::error::{RewriteError, RewriteResult};

/// One raw, order-preserving header as it appeared on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawHeader {
    pub name: String,
    pub value: String,
}

/// A parsed MIME part: its headers plus either a leaf body or a further
/// split multipart body
#[derive(Debug, Clone)]
pub struct MimePart {
    pub headers: Vec<RawHeader>,
    pub body: Body,
    /// line ending used in this part's header block ("\r\n" or "\n")
    eol: &'static [u8],
}

#[derive(Debug, Clone)]
pub enum Body {
    Leaf(Vec<u8>),
    Multipart {
        boundary: String,
        preamble: Vec<u8>,
        parts: Vec<MimePart>,
        epilogue: Vec<u8>,
    },
}

impl MimePart {
    /// First header value matching `name`, case-insensitive
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    pub fn content_type(&self) -> &str {
        self.header("Content-Type").unwrap_or("text/plain")
    }

    pub fn transfer_encoding(&self) -> &str {
        self.header("Content-Transfer-Encoding").unwrap_or("7bit")
    }
}

/// Parse a complete MIME part (headers + body) from raw bytes
pub fn parse(raw: &[u8]) -> RewriteResult<MimePart> {
    let (header_block, eol, rest) = split_headers(raw);
    let headers = parse_headers(header_block, eol)?;

    let content_type = headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case("Content-Type"))
        .map(|h| h.value.as_str())
        .unwrap_or("text/plain");

    if let Some(boundary) = extract_boundary(content_type) {
        let (preamble, parts, epilogue) = split_multipart(rest, &boundary)?;
        Ok(MimePart {
            headers,
            body: Body::Multipart {
                boundary,
                preamble,
                parts,
                epilogue,
            },
            eol,
        })
    } else {
        Ok(MimePart {
            headers,
            body: Body::Leaf(rest.to_vec()),
            eol,
        })
    }
}

/// Reserialize a part tree back to raw bytes
pub fn serialize(part: &MimePart) -> Vec<u8> {
    let mut out = Vec::new();
    for h in &part.headers {
        out.extend_from_slice(h.name.as_bytes());
        out.extend_from_slice(b": ");
        out.extend_from_slice(h.value.as_bytes());
        out.extend_from_slice(part.eol);
    }
    out.extend_from_slice(part.eol);
    out.extend_from_slice(&serialize_body(&part.body));
    out
}

/// Reserialize just a body (no header block) — used both for nested parts
/// and for the top-level body a milter session hands us, whose headers
/// were already consumed by separate `Header` callbacks
pub fn serialize_body(body: &Body) -> Vec<u8> {
    let mut out = Vec::new();
    match body {
        Body::Leaf(bytes) => out.extend_from_slice(bytes),
        Body::Multipart {
            boundary,
            preamble,
            parts,
            epilogue,
        } => {
            out.extend_from_slice(preamble);
            for p in parts {
                out.extend_from_slice(b"--");
                out.extend_from_slice(boundary.as_bytes());
                out.extend_from_slice(b"\r\n");
                out.extend_from_slice(&serialize(p));
                if !out.ends_with(b"\n") {
                    out.extend_from_slice(b"\r\n");
                }
            }
            out.extend_from_slice(b"--");
            out.extend_from_slice(boundary.as_bytes());
            out.extend_from_slice(b"--\r\n");
            out.extend_from_slice(epilogue);
        }
    }
    out
}

/// Parse a top-level body whose headers arrived separately (e.g. via
/// milter `Header` callbacks rather than inline in `raw`)
pub fn parse_body_only(content_type: &str, raw_body: &[u8]) -> RewriteResult<Body> {
    match extract_boundary(content_type) {
        Some(boundary) => {
            let (preamble, parts, epilogue) = split_multipart(raw_body, &boundary)?;
            Ok(Body::Multipart {
                boundary,
                preamble,
                parts,
                epilogue,
            })
        }
        None => Ok(Body::Leaf(raw_body.to_vec())),
    }
}

/// Split raw part bytes into (header block, eol style, body) at the first
/// blank line, trying CRLF first then bare LF
fn split_headers(raw: &[u8]) -> (&[u8], &'static [u8], &[u8]) {
    if let Some(pos) = find(raw, b"\r\n\r\n") {
        return (&raw[..pos], b"\r\n", &raw[pos + 4..]);
    }
    if let Some(pos) = find(raw, b"\n\n") {
        return (&raw[..pos], b"\n", &raw[pos + 2..]);
    }
    (raw, b"\r\n", b"")
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|w| w == needle)
}

/// Parse an RFC 2822 header block, honoring folded continuation lines
/// (lines starting with a space or tab)
fn parse_headers(block: &[u8], eol: &'static [u8]) -> RewriteResult<Vec<RawHeader>> {
    let text = String::from_utf8_lossy(block);
    let sep = std::str::from_utf8(eol).unwrap();
    let mut headers = Vec::new();
    for line in text.split(sep) {
        if line.is_empty() {
            continue;
        }
        if (line.starts_with(' ') || line.starts_with('\t')) && !headers.is_empty() {
            let last: &mut RawHeader = headers.last_mut().unwrap();
            last.value.push(' ');
            last.value.push_str(line.trim_start());
            continue;
        }
        match line.split_once(':') {
            Some((name, value)) => headers.push(RawHeader {
                name: name.trim().to_string(),
                value: value.trim().to_string(),
            }),
            None => return Err(RewriteError::InvalidHeaders(line.to_string())),
        }
    }
    Ok(headers)
}

/// Pull the `boundary` parameter out of a `Content-Type` value, if present
///
/// Delegates to `mailparse::parse_content_type` rather than an ad hoc
/// `.strip_prefix("boundary=")` scan: RFC 2045 §5.1 parameter names are
/// case-insensitive, so a legal `BOUNDARY="XYZ"` or `Boundary=XYZ` must be
/// recognized the same as `boundary=XYZ`, and `mailparse` already handles
/// that normalization (plus quoted-string unescaping) for us.
fn extract_boundary(content_type: &str) -> Option<String> {
    let parsed = mailparse::parse_content_type(content_type);
    if !parsed.mimetype.to_ascii_lowercase().starts_with("multipart/") {
        return None;
    }
    parsed.params.get("boundary").cloned()
}

/// Split a multipart body into (preamble, parts, epilogue) on the given
/// boundary, preserving the boundary string exactly as declared
fn split_multipart(body: &[u8], boundary: &str) -> RewriteResult<(Vec<u8>, Vec<MimePart>, Vec<u8>)> {
    let delim = format!("--{boundary}");
    let delim_bytes = delim.as_bytes();

    let mut segments: Vec<(usize, usize, bool)> = Vec::new();
    let mut search_from = 0;
    loop {
        let Some(rel) = find(&body[search_from..], delim_bytes) else {
            break;
        };
        let start = search_from + rel;
        let after = start + delim_bytes.len();
        let is_final = body[after..].starts_with(b"--");
        segments.push((start, after + if is_final { 2 } else { 0 }, is_final));
        search_from = after;
        if is_final {
            break;
        }
    }

    if segments.is_empty() {
        return Err(RewriteError::MissingBoundary);
    }

    let preamble = body[..segments[0].0].to_vec();
    let mut parts = Vec::new();

    for i in 0..segments.len() {
        let (_, this_end, is_final) = segments[i];
        if is_final {
            break;
        }
        let content_start = skip_line_ending(body, this_end);
        let content_end = segments[i + 1].0;
        parts.push(parse(&body[content_start..content_end])?);
    }

    let last = segments.last().unwrap();
    let epilogue_start = skip_line_ending(body, last.1);
    let epilogue = body[epilogue_start.min(body.len())..].to_vec();

    Ok((preamble, parts, epilogue))
}

/// Advance past a single trailing CRLF or LF right after `pos`
fn skip_line_ending(body: &[u8], pos: usize) -> usize {
    if body[pos..].starts_with(b"\r\n") {
        pos + 2
    } else if body[pos..].starts_with(b"\n") {
        pos + 1
    } else {
        pos
    }
}

#[cfg(test)]
mod tests {
    use super::{Body, parse, serialize};

    const SIMPLE_LEAF: &str = "Content-Type: text/plain\r\nContent-Transfer-Encoding: 7bit\r\n\r\nHello world";

    #[test]
    fn parses_leaf_headers_and_body() {
        let part = parse(SIMPLE_LEAF.as_bytes()).unwrap();
        assert_eq!(part.content_type(), "text/plain");
        assert_eq!(part.transfer_encoding(), "7bit");
        match &part.body {
            Body::Leaf(b) => assert_eq!(b, b"Hello world"),
            _ => panic!("expected leaf"),
        }
    }

    #[test]
    fn folded_header_continuation_is_joined() {
        let raw = "Subject: hello\r\n world\r\n\r\nbody";
        let part = parse(raw.as_bytes()).unwrap();
        assert_eq!(part.header("Subject"), Some("hello world"));
    }

    #[test]
    fn splits_multipart_and_preserves_boundary_on_reserialize() {
        let raw = concat!(
            "Content-Type: multipart/mixed; boundary=\"XYZ\"\r\n\r\n",
            "preamble text\r\n",
            "--XYZ\r\n",
            "Content-Type: text/plain\r\n\r\n",
            "first part\r\n",
            "--XYZ\r\n",
            "Content-Type: text/plain\r\n\r\n",
            "second part\r\n",
            "--XYZ--\r\n",
            "epilogue text",
        );
        let part = parse(raw.as_bytes()).unwrap();
        match &part.body {
            Body::Multipart { boundary, parts, .. } => {
                assert_eq!(boundary, "XYZ");
                assert_eq!(parts.len(), 2);
            }
            _ => panic!("expected multipart"),
        }
        let out = serialize(&part);
        let out_str = String::from_utf8(out).unwrap();
        assert!(out_str.contains("--XYZ\r\n"));
        assert!(out_str.contains("--XYZ--\r\n"));
        assert!(out_str.contains("first part"));
        assert!(out_str.contains("second part"));
    }

    #[test]
    fn recognizes_a_mixed_case_boundary_parameter_name() {
        let raw = concat!(
            "Content-Type: multipart/mixed; BOUNDARY=\"XYZ\"\r\n\r\n",
            "--XYZ\r\n",
            "Content-Type: text/plain\r\n\r\n",
            "only part\r\n",
            "--XYZ--\r\n",
        );
        let part = parse(raw.as_bytes()).unwrap();
        match &part.body {
            Body::Multipart { boundary, parts, .. } => {
                assert_eq!(boundary, "XYZ");
                assert_eq!(parts.len(), 1);
            }
            _ => panic!("expected multipart, got a single opaque leaf"),
        }
    }

    #[test]
    fn missing_boundary_delimiter_is_an_error() {
        let raw = "Content-Type: multipart/mixed; boundary=\"XYZ\"\r\n\r\nno boundary lines here";
        assert!(parse(raw.as_bytes()).is_err());
    }

    #[test]
    fn parses_and_reserializes_a_headerless_top_level_body() {
        let raw_body = concat!(
            "--XYZ\r\n",
            "Content-Type: text/plain\r\n\r\n",
            "only part\r\n",
            "--XYZ--\r\n",
        );
        let body = super::parse_body_only("multipart/mixed; boundary=XYZ", raw_body.as_bytes()).unwrap();
        match &body {
            Body::Multipart { parts, .. } => assert_eq!(parts.len(), 1),
            _ => panic!("expected multipart"),
        }
        let out = super::serialize_body(&body);
        assert_eq!(out, raw_body.as_bytes());
    }
}
