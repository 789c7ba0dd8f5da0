//! MIME rewriting: URL wrapping and external-message banners
//!
//! This crate implements the pure, side-effect-free core of the mail
//! filter: given a message's `Content-Type`/`Content-Transfer-Encoding`
//! and raw body bytes, it walks the MIME structure, wraps every
//! non-allowlisted URL behind a checking proxy, and stamps an
//! external-message banner onto each rewritten leaf. It does not speak
//! any mail protocol itself — that's [`mail-filter`]'s job, which feeds
//! this crate the header view a milter session already has in hand.

pub mod allowlist;
pub mod banners;
pub mod codec;
pub mod error;
pub mod linesplitter;
pub mod mime_tree;
pub mod rewriter;
pub mod subject;
pub mod urlscan;
pub mod wrap;

pub use allowlist::Allowlist;
pub use error::{RewriteError, RewriteResult};
pub use rewriter::{RewriterContext, rewrite_top_level};
pub use subject::{EMPTY_SUBJECT, HeaderPlan, collapse_reply_prefixes, plan_subject, plan_thread_topic, rewrite_value};
