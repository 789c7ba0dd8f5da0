//! Subject / Thread-Topic normalization
//!
//! Every externally-originated message gets an `[EXTERNAL] ` marker on its
//! `Subject` and `Thread-Topic` headers. Reply chains tend to accumulate
//! one marker and one localized reply tag per hop
//! (`"RE: [EXTERNAL] AW: [EXTERNAL] Quarterly"`), so before re-marking we
//! collapse any such chain down to a single `Re: `, giving
//! `"[EXTERNAL] Re: Quarterly"`. Header values are assumed already
//! MIME-decoded by the caller in the common case; this module also offers
//! a best-effort RFC 2047 decode for values that arrive still encoded.

use std::sync::LazyLock;

use regex::Regex;

/// Subject used when a message carries no Subject header at all
pub const EMPTY_SUBJECT: &str = "[EXTERNAL] - Empty Subject";

/// The marker every rewritten Subject/Thread-Topic is prefixed with
const EXTERNAL_MARKER: &str = "[EXTERNAL] ";

/// Matches one or more chained `<tag>: [EXTERNAL] ` groups anchored at the
/// start of the subject. The tag alternation covers every localized reply
/// marker this system is expected to recognize.
static REPLY_PREFIX_CHAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^((رد|回复|回覆|SV|Antw|VS|REF|RE|AW|ΑΠ|ΣΧΕΤ|השב|תשובה|Vá|R|RIF|BLS|Atb\.|RES|Odp|பதில்|YNT|ATB):\s+\[EXTERNAL\]\s+)+",
    )
    .expect("reply prefix chain pattern is valid")
});

/// Collapse any leading chain of localized `[EXTERNAL]`-tagged reply
/// prefixes down to a single `Re: `. Text with no matching prefix is
/// returned unchanged. Idempotent: `collapse(collapse(s)) == collapse(s)`.
pub fn collapse_reply_prefixes(subject: &str) -> String {
    if REPLY_PREFIX_CHAIN.is_match(subject) {
        REPLY_PREFIX_CHAIN.replace(subject, "Re: ").into_owned()
    } else {
        subject.to_string()
    }
}

/// Best-effort RFC 2047 decode: on any decode failure, the raw value is
/// returned unchanged rather than propagating an error, since a Subject we
/// can't decode is still better rewritten-as-is than dropped.
pub fn decode_best_effort(raw: &str) -> String {
    match mailparse::parse_header(format!("Subject: {raw}\r\n").as_bytes()) {
        Ok((header, _)) => header.get_value(),
        Err(_) => raw.to_string(),
    }
}

/// Compute the rewritten value for one Subject or Thread-Topic occurrence
///
/// Idempotent: a value already carrying the `[EXTERNAL] ` marker has it
/// stripped before the reply-prefix collapse runs (so it isn't mistaken
/// for a collapsible chain) and is re-marked once, giving
/// `rewrite_value("[EXTERNAL] Re: Hello") == "[EXTERNAL] Re: Hello"`.
pub fn rewrite_value(raw: &str) -> String {
    let decoded = decode_best_effort(raw);
    let unmarked = decoded.strip_prefix(EXTERNAL_MARKER).unwrap_or(&decoded);
    format!("{EXTERNAL_MARKER}{}", collapse_reply_prefixes(unmarked))
}

/// What to do with a header that may or may not already be present
///
/// Avoids issuing a dangling `ChangeHeader` call for an index where no
/// header of that name existed in the original message: milter filters
/// must `AddHeader` when none is present and `ChangeHeader` only for
/// existing occurrences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderPlan {
    /// No header of this name existed; add a single new one with this value
    Add(String),
    /// One or more headers of this name existed; replace each occurrence
    /// (by 1-based index, matching the milter `ChangeHeader` index
    /// convention) with the corresponding new value
    Change(Vec<String>),
}

/// Build the plan for rewriting every observed `Subject` occurrence
pub fn plan_subject(observed: &[String]) -> HeaderPlan {
    if observed.is_empty() {
        HeaderPlan::Add(EMPTY_SUBJECT.to_string())
    } else {
        HeaderPlan::Change(observed.iter().map(|v| rewrite_value(v)).collect())
    }
}

/// Build the plan for rewriting every observed `Thread-Topic` occurrence
///
/// Unlike Subject, an absent Thread-Topic is not synthesized: the original
/// header is optional metadata, not the message's identifying line.
pub fn plan_thread_topic(observed: &[String]) -> HeaderPlan {
    HeaderPlan::Change(observed.iter().map(|v| rewrite_value(v)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaves_plain_subject_untouched_by_collapse() {
        assert_eq!(collapse_reply_prefixes("hello world"), "hello world");
    }

    #[test]
    fn collapses_single_prefix() {
        assert_eq!(
            collapse_reply_prefixes("RE: [EXTERNAL] hello"),
            "Re: hello"
        );
    }

    #[test]
    fn collapses_chained_prefixes_of_mixed_tags() {
        assert_eq!(
            collapse_reply_prefixes("RE: [EXTERNAL] AW: [EXTERNAL] SV: [EXTERNAL] hello"),
            "Re: hello"
        );
    }

    #[test]
    fn collapse_is_idempotent() {
        let once = collapse_reply_prefixes("RE: [EXTERNAL] AW: [EXTERNAL] hello");
        let twice = collapse_reply_prefixes(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn matches_non_latin_tags() {
        assert_eq!(
            collapse_reply_prefixes("回复: [EXTERNAL] hello"),
            "Re: hello"
        );
    }

    #[test]
    fn chained_reply_prefix_scenario() {
        assert_eq!(
            rewrite_value("RE: [EXTERNAL] AW: [EXTERNAL] Quarterly"),
            "[EXTERNAL] Re: Quarterly"
        );
    }

    #[test]
    fn rewrite_value_is_idempotent_in_steady_state() {
        let once = rewrite_value("Hello");
        let twice = rewrite_value(&once);
        assert_eq!(once, twice);
        assert_eq!(twice, "[EXTERNAL] Hello");

        let marked = "[EXTERNAL] Re: Hello";
        assert_eq!(rewrite_value(marked), marked);
    }

    #[test]
    fn plan_adds_literal_empty_subject_when_none_observed() {
        assert_eq!(
            plan_subject(&[]),
            HeaderPlan::Add(EMPTY_SUBJECT.to_string())
        );
    }

    #[test]
    fn plan_changes_each_existing_subject_occurrence() {
        let plan = plan_subject(&["RE: [EXTERNAL] hi".to_string(), "plain".to_string()]);
        assert_eq!(
            plan,
            HeaderPlan::Change(vec![
                "[EXTERNAL] Re: hi".to_string(),
                "[EXTERNAL] plain".to_string()
            ])
        );
    }

    #[test]
    fn thread_topic_plan_never_adds() {
        assert_eq!(plan_thread_topic(&[]), HeaderPlan::Change(vec![]));
    }
}
