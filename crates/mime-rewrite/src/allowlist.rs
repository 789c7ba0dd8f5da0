//! Host-suffix and literal URL allowlist
//!
//! URLs whose host matches a configured suffix, or that match a pinned
//! literal string exactly, are left byte-unchanged by the rewriter. The
//! wrapped-URL host itself is always allowlisted by suffix so that
//! rewriting an already-wrapped URL is a no-op (URL wrapping is
//! idempotent; banner insertion is not, see `rewriter`).

/// Default corporate host suffixes trusted without rewriting
pub const DEFAULT_SUFFIXES: &[&str] = &["konrad-technologies.de", "konrad-technologies.com"];

/// Default pinned exact-match allowlist entries
pub const DEFAULT_EXACT: &[&str] = &["https://demvreply.datevnet.de/web.app?op=init"];

/// Host-suffix + literal-string allowlist
#[derive(Debug, Clone)]
pub struct Allowlist {
    suffixes: Vec<String>,
    exact: Vec<String>,
}

impl Allowlist {
    /// Build the default allowlist, plus the given proxy host (so wrapped
    /// URLs are never re-wrapped)
    pub fn with_proxy_host(proxy_host: &str) -> Self {
        let mut suffixes: Vec<String> = DEFAULT_SUFFIXES.iter().map(|s| s.to_string()).collect();
        suffixes.push(proxy_host.to_ascii_lowercase());
        Self {
            suffixes,
            exact: DEFAULT_EXACT.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Construct from explicit suffix/exact lists, e.g. from CLI flags
    pub fn new(suffixes: Vec<String>, exact: Vec<String>) -> Self {
        Self { suffixes, exact }
    }

    /// Add extra host suffixes (e.g. CLI `--allow-suffix` flags)
    pub fn add_suffixes<I: IntoIterator<Item = String>>(&mut self, more: I) {
        self.suffixes.extend(more);
    }

    /// Add extra exact-match entries (e.g. CLI `--allow-exact` flags)
    pub fn add_exact<I: IntoIterator<Item = String>>(&mut self, more: I) {
        self.exact.extend(more);
    }

    /// Whether `raw` is trusted verbatim: either a pinned literal, or a
    /// parseable URL whose host ends with one of the configured suffixes
    pub fn allows(&self, raw: &str) -> bool {
        if self.exact.iter().any(|e| e == raw) {
            return true;
        }
        let Ok(parsed) = url::Url::parse(raw) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        self.suffixes.iter().any(|suffix| {
            host == suffix.as_str() || host.ends_with(&format!(".{suffix}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::Allowlist;

    #[test]
    fn allows_configured_suffix() {
        let al = Allowlist::with_proxy_host("urlcheck.example.com");
        assert!(al.allows("https://docs.konrad-technologies.de/x"));
        assert!(al.allows("https://konrad-technologies.com/y"));
        assert!(!al.allows("https://konrad-technologies.com.evil.tld/y"));
    }

    #[test]
    fn does_not_allow_a_host_that_merely_ends_with_the_suffix_text() {
        let al = Allowlist::with_proxy_host("urlcheck.example.com");
        assert!(!al.allows("https://evilkonrad-technologies.de/x"));
    }

    #[test]
    fn allows_pinned_literal_exact_match_only() {
        let al = Allowlist::with_proxy_host("proxy");
        assert!(al.allows("https://demvreply.datevnet.de/web.app?op=init"));
        assert!(!al.allows("https://demvreply.datevnet.de/web.app?op=init&x=1"));
    }

    #[test]
    fn allows_the_proxy_host_itself() {
        let al = Allowlist::with_proxy_host("urlcheck.example.com");
        assert!(al.allows("https://urlcheck.example.com/check/abc"));
    }

    #[test]
    fn rejects_unparseable_and_unrelated_hosts() {
        let al = Allowlist::with_proxy_host("proxy");
        assert!(!al.allows("not a url"));
        assert!(!al.allows("https://evil.example/x"));
    }
}
