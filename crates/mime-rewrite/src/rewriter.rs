//! Top-level rewrite orchestration
//!
//! Walks a MIME part tree, rewriting `text/plain`, `text/html` and
//! `application/rtf` leaves in place (URL wrapping plus a banner) and
//! recursing into `multipart/*` containers. Every other leaf content type
//! is left byte-identical.
//!
//! A leaf is either rewritten or copied verbatim — never both. Early
//! drafts of this rewriter (mirroring a bug in the system it replaces)
//! built a *new* buffer for the rewritten bytes while the recursive
//! multipart walk also retained the original encoded bytes, so both ended
//! up in the output. Here the leaf's `Body::Leaf` is mutated in place
//! exactly once per part, which makes that duplication structurally
//! impossible: there is only ever one body buffer for a leaf, and it holds
//! either the untouched bytes or the rewritten ones.

use crate::allowlist::Allowlist;
use crate::banners;
use crate::codec;
use crate::error::{RewriteError, RewriteResult};
use crate::mime_tree::{self, Body, MimePart};
use crate::urlscan;
use crate::wrap;

/// Recursion depth past which we refuse to descend further into nested
/// multipart containers, guarding against pathological or adversarial
/// nesting.
pub const DEFAULT_MAX_DEPTH: u8 = 8;

/// Shared rewrite configuration for one filter session
#[derive(Debug, Clone)]
pub struct RewriterContext {
    pub proxy_host: String,
    pub allowlist: Allowlist,
    pub max_depth: u8,
}

impl RewriterContext {
    pub fn new(proxy_host: impl Into<String>, allowlist: Allowlist) -> Self {
        Self {
            proxy_host: proxy_host.into(),
            allowlist,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    fn wrap_unless_allowed(&self, url: &str) -> String {
        if url.starts_with("cid:") || self.allowlist.allows(url) {
            url.to_string()
        } else {
            wrap::wrap(&self.proxy_host, url.as_bytes())
        }
    }
}

/// Rewrite a top-level body whose headers were already consumed
/// separately (the milter `Header` callbacks), returning the rewritten
/// raw body or `None` if nothing changed.
///
/// The top-level dispatch is stricter than the per-leaf one run for
/// nested multipart children: a message whose `Content-Type` is neither
/// absent, `text/*`, `application/rtf`/`text/rtf`, nor `multipart/*`
/// fails closed with [`RewriteError::Unsupported`] rather than being
/// silently treated as an untouched leaf, since there is no containing
/// part for it to be "copied verbatim" into.
pub fn rewrite_top_level(
    ctx: &RewriterContext,
    content_type: &str,
    transfer_encoding: &str,
    raw_body: &[u8],
) -> RewriteResult<Option<Vec<u8>>> {
    if !top_level_supported(content_type) {
        return Err(RewriteError::Unsupported(content_type.to_string()));
    }
    let mut body = mime_tree::parse_body_only(content_type, raw_body)?;
    let changed = rewrite_body(ctx, content_type, transfer_encoding, &mut body, 0)?;
    Ok(changed.then(|| mime_tree::serialize_body(&body)))
}

/// Whether a top-level `Content-Type` is one the rewriter can dispatch on
/// at all: absent, `text/*`, `application/rtf`/`text/rtf`, or
/// `multipart/*`. Anything else (e.g. a single-part `application/pdf`
/// message) has no leaf to rewrite and no container to recurse into.
fn top_level_supported(content_type: &str) -> bool {
    let base = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    base.is_empty()
        || base.starts_with("text/")
        || base == "application/rtf"
        || base.starts_with("multipart/")
}

/// Rewrite one already-parsed part tree in place, returning whether
/// anything changed
pub fn rewrite_part(ctx: &RewriterContext, part: &mut MimePart, depth: u8) -> RewriteResult<bool> {
    let content_type = part.content_type().to_string();
    let transfer_encoding = part.transfer_encoding().to_string();
    rewrite_body(ctx, &content_type, &transfer_encoding, &mut part.body, depth)
}

fn rewrite_body(
    ctx: &RewriterContext,
    content_type: &str,
    transfer_encoding: &str,
    body: &mut Body,
    depth: u8,
) -> RewriteResult<bool> {
    if depth > ctx.max_depth {
        return Err(RewriteError::RecursionTooDeep(depth));
    }

    match body {
        Body::Multipart { parts, .. } => {
            let mut changed = false;
            for part in parts.iter_mut() {
                changed |= rewrite_part(ctx, part, depth + 1)?;
            }
            Ok(changed)
        }
        Body::Leaf(bytes) => {
            let Some(kind) = classify(content_type) else {
                return Ok(false);
            };
            let decoded = codec::decode(bytes, transfer_encoding)?;
            let rewritten = rewrite_leaf_text(ctx, kind, &decoded)?;
            *bytes = codec::encode(&rewritten, transfer_encoding)?;
            Ok(true)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LeafKind {
    PlainText,
    Html,
    Rtf,
}

/// Classify a leaf's base content type, ignoring any `; charset=...`
/// parameters. Anything not in this list is passed through untouched.
fn classify(content_type: &str) -> Option<LeafKind> {
    let base = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    match base.as_str() {
        "text/plain" | "" => Some(LeafKind::PlainText),
        "text/html" => Some(LeafKind::Html),
        "application/rtf" | "text/rtf" => Some(LeafKind::Rtf),
        _ => None,
    }
}

/// Rewrite a decoded leaf body: wrap untrusted URLs, then prepend/insert
/// the banner appropriate to the leaf kind.
///
/// A leaf whose decoded body is not valid UTF-8 can't be scanned for URLs
/// or banner-stamped safely, so this surfaces
/// [`RewriteError::NonUtf8LeafBody`] rather than silently leaving the leaf
/// untouched — per the rewrite contract, a failure this deep aborts the
/// whole rewrite rather than producing a half-rewritten message.
fn rewrite_leaf_text(ctx: &RewriterContext, kind: LeafKind, decoded: &[u8]) -> RewriteResult<Vec<u8>> {
    let text = std::str::from_utf8(decoded).map_err(|_| RewriteError::NonUtf8LeafBody)?;

    let rewritten_urls = urlscan::replace_all(text, |url| ctx.wrap_unless_allowed(url));

    let with_banner = match kind {
        LeafKind::PlainText => format!("{}{}", banners::PLAIN_TEXT_BANNER, rewritten_urls),
        LeafKind::Html => format!("{}{}", banners::HTML_BANNER, rewritten_urls),
        LeafKind::Rtf => {
            String::from_utf8(banners::insert_rtf_banner(rewritten_urls.as_bytes()))
                .unwrap_or(rewritten_urls)
        }
    };

    Ok(with_banner.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> RewriterContext {
        RewriterContext::new("proxy.example.com", Allowlist::with_proxy_host("proxy.example.com"))
    }

    #[test]
    fn plain_text_leaf_gets_banner_and_wrapped_urls() {
        let out = rewrite_top_level(&ctx(), "text/plain", "7bit", b"see https://evil.example/x")
            .unwrap()
            .unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.starts_with("** WARNING"));
        assert!(out.contains("https://proxy.example.com/check/"));
        assert!(!out.contains("evil.example"));
    }

    #[test]
    fn cid_reference_is_left_unwrapped() {
        let out = rewrite_top_level(&ctx(), "text/html", "7bit", b"<img src=cid:part1.jpg@example>")
            .unwrap()
            .unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("cid:part1.jpg@example"));
    }

    #[test]
    fn allowlisted_url_is_left_unwrapped() {
        let out = rewrite_top_level(
            &ctx(),
            "text/plain",
            "7bit",
            b"see https://konrad-technologies.com/y",
        )
        .unwrap()
        .unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("https://konrad-technologies.com/y"));
    }

    #[test]
    fn html_leaf_gets_html_banner() {
        let out = rewrite_top_level(&ctx(), "text/html", "7bit", b"<p>hi</p>")
            .unwrap()
            .unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.starts_with("<!DOCTYPE html>"));
        assert!(out.ends_with("<p>hi</p>"));
    }

    #[test]
    fn non_utf8_leaf_body_aborts_the_rewrite() {
        let err = rewrite_top_level(&ctx(), "text/plain", "8bit", b"\xff\xfe not utf8").unwrap_err();
        assert!(matches!(err, RewriteError::NonUtf8LeafBody));
    }

    #[test]
    fn unsupported_top_level_content_type_fails_closed() {
        let err = rewrite_top_level(&ctx(), "application/octet-stream", "base64", b"AAAA").unwrap_err();
        assert!(matches!(err, RewriteError::Unsupported(_)));
    }

    #[test]
    fn nested_unsupported_leaf_is_copied_verbatim_not_rejected() {
        let raw = concat!(
            "--B\r\n",
            "Content-Type: application/octet-stream\r\n\r\n",
            "binarydata\r\n",
            "--B--\r\n",
        );
        let out = rewrite_top_level(&ctx(), "multipart/mixed; boundary=B", "7bit", raw.as_bytes()).unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn multipart_recurses_and_rewrites_each_eligible_leaf_exactly_once() {
        let raw = concat!(
            "--B\r\n",
            "Content-Type: text/plain\r\n\r\n",
            "see https://evil.example/a\r\n",
            "--B\r\n",
            "Content-Type: application/octet-stream\r\n\r\n",
            "binarydata\r\n",
            "--B--\r\n",
        );
        let out = rewrite_top_level(&ctx(), "multipart/mixed; boundary=B", "7bit", raw.as_bytes())
            .unwrap()
            .unwrap();
        let out = String::from_utf8(out).unwrap();
        assert_eq!(out.matches("WARNING").count(), 1);
        assert!(out.contains("binarydata"));
        assert!(!out.contains("evil.example"));
    }

    #[test]
    fn recursion_past_max_depth_is_rejected() {
        let mut ctx = ctx();
        ctx.max_depth = 0;
        let raw = concat!(
            "--B\r\n",
            "Content-Type: text/plain\r\n\r\n",
            "hi\r\n",
            "--B--\r\n",
        );
        let err = rewrite_top_level(&ctx, "multipart/mixed; boundary=B", "7bit", raw.as_bytes());
        assert!(err.is_err());
    }
}
