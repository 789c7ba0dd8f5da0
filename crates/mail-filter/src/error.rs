//! Error model for the mail filter session
//!
//! Every variant here is fail-open: once converted at the session
//! boundary, the worst outcome is "deliver the message unmodified," never
//! "bounce legitimate mail because the rewriter choked on it."

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FilterError {
    /// A non-fatal failure while rewriting a MIME part
    #[error("rewrite failed: {0}")]
    RewriteError(#[from] mime_rewrite::RewriteError),

    /// The MTA rejected an add/change-header or replace-body call
    #[error("modifier call rejected: {0}")]
    ModifierError(String),
}

pub type FilterResult<T> = Result<T, FilterError>;
