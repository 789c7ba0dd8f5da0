//! Command-line configuration
//!
//! Mirrors the CLI surface of the system this filter replaces: a socket
//! protocol/address pair, plus the proxy host and allowlist extensions
//! needed to build a [`mime_rewrite::RewriterContext`].

use clap::Parser;

/// Connection protocol for the milter socket
#[derive(Debug, Clone, Copy, clap::ValueEnum, PartialEq, Eq)]
pub enum Protocol {
    Unix,
    Tcp,
}

/// External-mail URL rewriting content filter
#[derive(Debug, Parser)]
#[command(name = "mail-filter", about = "Milter content filter that wraps URLs in external mail")]
pub struct Cli {
    /// Socket protocol to listen on
    #[arg(long, value_enum, default_value_t = Protocol::Unix)]
    pub proto: Protocol,

    /// Socket path (unix) or host:port (tcp)
    #[arg(long, default_value = "/var/spool/postfix/milters/ext.sock")]
    pub addr: String,

    /// Host used to build wrapped-URL links, e.g. `urlcheck.example.com`
    #[arg(long, default_value = "urlcheck.example.com")]
    pub proxy_host: String,

    /// Additional trusted host suffixes, beyond the built-in defaults (repeatable)
    #[arg(long = "allow-suffix")]
    pub allow_suffixes: Vec<String>,

    /// Additional trusted exact-match URLs, beyond the built-in defaults (repeatable)
    #[arg(long = "allow-exact")]
    pub allow_exact: Vec<String>,
}
