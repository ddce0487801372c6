//! Configuration management for Genrelay
//!
//! Configuration is loaded from environment variables. The upstream
//! credential is deliberately not part of [`Config`]; it is read on every
//! invocation through a [`crate::credential::CredentialSource`].

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default upstream API base used by the built-in endpoint table
pub const DEFAULT_UPSTREAM_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default name of the environment variable holding the upstream credential
pub const DEFAULT_CREDENTIAL_ENV: &str = "GOOGLE_API_KEY";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,

    /// Environment variable the credential is read from on each request
    pub credential_env_var: String,

    /// Base URL for the built-in endpoint table
    pub upstream_base_url: String,
    /// Optional JSON file replacing the built-in endpoint table
    pub endpoints_file: Option<PathBuf>,

    /// Maximum wait between upstream reads (unbounded when unset)
    pub upstream_timeout_secs: Option<u64>,
    /// Connect timeout for the upstream (unbounded when unset)
    pub connect_timeout_secs: Option<u64>,

    /// Inbound body size cap in bytes
    pub max_body_bytes: usize,

    /// Emit JSON log lines instead of human-readable text
    pub log_json: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: env::var("RELAY_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("RELAY_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid RELAY_PORT")?,

            credential_env_var: env::var("RELAY_CREDENTIAL_ENV")
                .unwrap_or_else(|_| DEFAULT_CREDENTIAL_ENV.to_string()),

            upstream_base_url: env::var("RELAY_UPSTREAM_URL")
                .unwrap_or_else(|_| DEFAULT_UPSTREAM_URL.to_string()),
            endpoints_file: env::var("RELAY_ENDPOINTS_FILE").ok().map(PathBuf::from),

            upstream_timeout_secs: optional_secs("RELAY_UPSTREAM_TIMEOUT_SECS")?,
            connect_timeout_secs: optional_secs("RELAY_CONNECT_TIMEOUT_SECS")?,

            max_body_bytes: env::var("RELAY_MAX_BODY_BYTES")
                .unwrap_or_else(|_| "10485760".to_string())
                .parse()
                .context("Invalid RELAY_MAX_BODY_BYTES")?,

            log_json: env::var("RELAY_LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        })
    }

    /// Upstream read timeout, if one is configured
    pub fn upstream_timeout(&self) -> Option<Duration> {
        self.upstream_timeout_secs.map(Duration::from_secs)
    }

    /// Upstream connect timeout, if one is configured
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            credential_env_var: DEFAULT_CREDENTIAL_ENV.to_string(),
            upstream_base_url: DEFAULT_UPSTREAM_URL.to_string(),
            endpoints_file: None,
            upstream_timeout_secs: None,
            connect_timeout_secs: None,
            max_body_bytes: 10 * 1024 * 1024,
            log_json: false,
        }
    }
}

/// Parse an optional whole-seconds value; `0` disables the bound
fn optional_secs(var: &str) -> Result<Option<u64>> {
    match env::var(var) {
        Ok(raw) => {
            let secs: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("Invalid {}", var))?;
            Ok((secs > 0).then_some(secs))
        }
        Err(_) => Ok(None),
    }
}
