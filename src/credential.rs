//! Upstream credential lookup
//!
//! The credential is read once per invocation, never cached across
//! requests, so rotating the environment value takes effect immediately.

use std::env;

/// Source of the server-held upstream credential
pub trait CredentialSource: Send + Sync {
    /// Current credential, `None` when absent or empty
    fn credential(&self) -> Option<String>;

    /// Human-readable origin for health reports (never the secret itself)
    fn describe(&self) -> String;
}

/// Reads the credential from a process environment variable
#[derive(Debug, Clone)]
pub struct EnvCredential {
    var: String,
}

impl EnvCredential {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl CredentialSource for EnvCredential {
    fn credential(&self) -> Option<String> {
        env::var(&self.var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn describe(&self) -> String {
        format!("env:{}", self.var)
    }
}

/// Fixed credential, for embedding and tests
#[derive(Debug, Clone, Default)]
pub struct StaticCredential(Option<String>);

impl StaticCredential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Some(value.into()))
    }

    /// A source that never yields a credential
    pub fn missing() -> Self {
        Self(None)
    }
}

impl CredentialSource for StaticCredential {
    fn credential(&self) -> Option<String> {
        self.0.clone().filter(|v| !v.trim().is_empty())
    }

    fn describe(&self) -> String {
        "static".to_string()
    }
}
