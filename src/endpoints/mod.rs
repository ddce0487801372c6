//! Endpoint table
//!
//! Immutable mapping from a caller-facing target identifier to the upstream
//! URL it is forwarded to and the delivery mode used for its response.
//! Built once at startup and shared read-only by every invocation.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};

/// How the upstream response is delivered to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayMode {
    /// Read the whole upstream body and answer with one JSON document
    #[default]
    Buffered,
    /// Forward upstream bytes as an event stream while they arrive
    Streamed,
}

impl RelayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelayMode::Buffered => "buffered",
            RelayMode::Streamed => "streamed",
        }
    }
}

/// One upstream target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointSpec {
    /// Upstream URL without the credential
    pub url: String,
    #[serde(default)]
    pub mode: RelayMode,
}

impl EndpointSpec {
    pub fn buffered(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            mode: RelayMode::Buffered,
        }
    }

    pub fn streamed(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            mode: RelayMode::Streamed,
        }
    }
}

/// Model used by the built-in text generation targets
const TEXT_MODEL: &str = "gemini-2.5-flash-preview-05-20";
/// Model used by the built-in image generation target
const IMAGE_MODEL: &str = "imagen-3.0-generate-002";

/// Target identifier to upstream endpoint
#[derive(Debug, Clone)]
pub struct EndpointTable {
    entries: HashMap<String, EndpointSpec>,
}

impl EndpointTable {
    /// Build a table, rejecting entries whose URL is not absolute http(s)
    pub fn new<I, K>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, EndpointSpec)>,
        K: Into<String>,
    {
        let mut table = HashMap::new();
        for (id, spec) in entries {
            let id = id.into();
            if id.trim().is_empty() {
                bail!("Endpoint table contains an empty target identifier");
            }
            let url = Url::parse(&spec.url)
                .with_context(|| format!("Invalid URL for target '{}'", id))?;
            if !matches!(url.scheme(), "http" | "https") {
                bail!("Target '{}' must use http or https, got {}", id, url.scheme());
            }
            table.insert(id, spec);
        }
        Ok(Self { entries: table })
    }

    /// Built-in targets rooted at `base_url`
    pub fn builtin(base_url: &str) -> Result<Self> {
        let base = base_url.trim_end_matches('/');
        Self::new([
            (
                "gemini",
                EndpointSpec::buffered(format!("{}/models/{}:generateContent", base, TEXT_MODEL)),
            ),
            (
                "imagen",
                EndpointSpec::buffered(format!("{}/models/{}:predict", base, IMAGE_MODEL)),
            ),
            (
                "geminiStream",
                EndpointSpec::streamed(format!(
                    "{}/models/{}:streamGenerateContent?alt=sse",
                    base, TEXT_MODEL
                )),
            ),
        ])
    }

    /// Parse a table from JSON: `{"<id>": {"url": "...", "mode": "streamed"}}`
    pub fn from_json(raw: &str) -> Result<Self> {
        let entries: HashMap<String, EndpointSpec> =
            serde_json::from_str(raw).context("Endpoint table is not valid JSON")?;
        if entries.is_empty() {
            bail!("Endpoint table is empty");
        }
        Self::new(entries)
    }

    /// Load a table from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read endpoint table {}", path.display()))?;
        Self::from_json(&raw)
    }

    pub fn get(&self, target_id: &str) -> Option<&EndpointSpec> {
        self.entries.get(target_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Known identifiers, sorted
    pub fn target_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}
