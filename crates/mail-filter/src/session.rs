//! Per-connection filter session
//!
//! One [`FilterContext`] lives for the duration of one mail transaction.
//! Header observations accumulate through `on_header`, the body
//! accumulates through `on_body`, and the actual rewrite happens exactly
//! once, synchronously, inside `on_eom` — mirroring the ordering
//! guarantee that header observations precede end-of-headers, which
//! precedes body chunks, which precede end-of-body.

use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use indymilter::{Actions, Context, EomContext, IntoCString, NegotiateContext, Status};
use mime_rewrite::{HeaderPlan, RewriterContext, plan_subject, plan_thread_topic, rewrite_top_level};

use crate::error::{FilterError, FilterResult};

/// Per-session accumulated state
#[derive(Debug, Default)]
pub struct FilterContext {
    /// Every header observed, in arrival order, name/value as received
    headers: Vec<(String, String)>,
    body: BytesMut,
}

impl FilterContext {
    fn header_values(&self, name: &str) -> Vec<String> {
        self.headers
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
            .collect()
    }

    fn first_header(&self, name: &str, default: &str) -> String {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
            .unwrap_or_else(|| default.to_string())
    }
}

/// Request `ADD_HEADER`/`CHANGE_HEADER`/`REPLACE_BODY`; everything else
/// (connection, HELO, MAIL FROM, RCPT TO) is simply never hooked below, so
/// the MTA is told not to bother sending those events at all.
pub async fn on_negotiate(context: &mut NegotiateContext<FilterContext>) -> Status {
    context.requested_actions |= Actions::ADD_HEADER | Actions::CHANGE_HEADER | Actions::REPLACE_BODY;
    Status::Continue
}

pub async fn on_header(
    context: &mut Context<FilterContext>,
    name: std::ffi::CString,
    value: std::ffi::CString,
) -> Status {
    let ctx = context.data.get_or_insert_with(FilterContext::default);
    ctx.headers.push((
        name.to_string_lossy().into_owned(),
        value.to_string_lossy().into_owned(),
    ));
    Status::Continue
}

pub async fn on_eoh(_context: &mut Context<FilterContext>) -> Status {
    Status::Continue
}

pub async fn on_body(context: &mut Context<FilterContext>, data: Bytes) -> Status {
    if let Some(ctx) = context.data.as_mut() {
        ctx.body.extend_from_slice(&data);
    }
    Status::Continue
}

pub async fn on_eom(context: &mut EomContext<FilterContext>, rewriter: Arc<RewriterContext>) -> Status {
    let Some(ctx) = context.data.as_ref() else {
        return Status::Accept;
    };

    let content_type = ctx.first_header("Content-Type", "text/plain");
    let transfer_encoding = ctx.first_header("Content-Transfer-Encoding", "7bit");

    let rewritten_body = match rewrite_top_level(&rewriter, &content_type, &transfer_encoding, &ctx.body) {
        Ok(body) => body,
        Err(e) => {
            let err = FilterError::from(e);
            let snapshot_path = snapshot_for_postmortem(&ctx.body);
            tracing::warn!(
                error = %err,
                snapshot = ?snapshot_path,
                "rewrite failed, accepting message unmodified"
            );
            return Status::Accept;
        }
    };

    let subject_plan = plan_subject(&ctx.header_values("Subject"));
    let topic_plan = plan_thread_topic(&ctx.header_values("Thread-Topic"));

    if let Err(e) = apply_header_plan(&context.actions, "Subject", subject_plan).await {
        tracing::warn!(error = %e, "modifier rejected Subject update, accepting message unmodified");
        return Status::Accept;
    }
    if let Err(e) = apply_header_plan(&context.actions, "Thread-Topic", topic_plan).await {
        tracing::warn!(error = %e, "modifier rejected Thread-Topic update, accepting message unmodified");
        return Status::Accept;
    }

    if let Some(body) = rewritten_body {
        if let Err(e) = context.actions.replace_body(&body).await {
            let err = FilterError::ModifierError(e.to_string());
            tracing::warn!(error = %err, "modifier rejected body replacement, accepting message unmodified");
            return Status::Accept;
        }
    }

    Status::Accept
}

/// Write the raw, un-rewritten body to a temp file for later inspection
/// when a rewrite fails partway through. Best-effort: if the write itself
/// fails, we log that and move on rather than letting a postmortem
/// failure turn into a bounced message.
fn snapshot_for_postmortem(raw_body: &[u8]) -> Option<std::path::PathBuf> {
    match tempfile::Builder::new().prefix("urlmilter-mail-").tempfile() {
        Ok(mut file) => {
            if let Err(e) = std::io::Write::write_all(&mut file, raw_body) {
                tracing::warn!(error = %e, "failed to write rewrite-failure snapshot");
                return None;
            }
            match file.keep() {
                Ok((_, path)) => Some(path),
                Err(e) => {
                    tracing::warn!(error = %e, "failed to persist rewrite-failure snapshot");
                    None
                }
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to create rewrite-failure snapshot file");
            None
        }
    }
}

/// Apply an ensure/change header plan in the order the protocol expects:
/// a single `AddHeader` when none existed, or one `ChangeHeader` per
/// existing occurrence (1-based), never both.
async fn apply_header_plan(
    actions: &indymilter::EomActions,
    name: &str,
    plan: HeaderPlan,
) -> FilterResult<()> {
    match plan {
        HeaderPlan::Add(value) => actions
            .add_header(name.into_c_string(), value.into_c_string())
            .await
            .map_err(|e| FilterError::ModifierError(e.to_string())),
        HeaderPlan::Change(values) => {
            for (idx, value) in values.into_iter().enumerate() {
                actions
                    .change_header(name.into_c_string(), (idx + 1) as u32, Some(value.into_c_string()))
                    .await
                    .map_err(|e| FilterError::ModifierError(e.to_string()))?;
            }
            Ok(())
        }
    }
}
