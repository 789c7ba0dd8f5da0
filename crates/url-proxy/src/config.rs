//! Environment-driven configuration
//!
//! Every variable has an explicit default except `SB_API_KEY`, whose
//! absence aborts startup.

use std::env;
use std::env::VarError;

use crate::error::{ProxyError, ProxyResult};

/// Server-wide configuration
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Hosted Safe-Browsing-style API key; startup aborts if unset
    pub sb_api_key: String,
    /// Address the HTTP server binds to
    pub bind: String,
    /// External host used to build/validate wrapped URLs
    pub host: String,
    /// Directory served at `/static/*path`
    pub static_dir: String,
}

impl ProxyConfig {
    pub fn load_from_env() -> ProxyResult<Self> {
        Ok(Self {
            sb_api_key: required_env("SB_API_KEY")?,
            bind: optional_env("URL_PROXY_BIND", "0.0.0.0:8080"),
            host: optional_env("URL_PROXY_HOST", "urlcheck.example.com"),
            static_dir: optional_env("URL_PROXY_STATIC_DIR", "./static"),
        })
    }
}

/// Read a required environment variable, returning error if missing or empty
fn required_env(key: &str) -> ProxyResult<String> {
    match env::var(key) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        Ok(_) | Err(VarError::NotPresent) => Err(ProxyError::Config(format!(
            "missing required environment variable {key}"
        ))),
        Err(VarError::NotUnicode(_)) => Err(ProxyError::Config(format!(
            "environment variable {key} contains non-unicode data"
        ))),
    }
}

/// Read an optional environment variable, falling back to `default`
fn optional_env(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::optional_env;

    #[test]
    fn optional_env_falls_back_when_unset() {
        assert_eq!(optional_env("URL_PROXY_DEFINITELY_UNSET_KEY", "fallback"), "fallback");
    }
}
