//! Endpoint resolution
//!
//! Turns a target identifier plus the per-invocation credential into the
//! concrete upstream URL. The credential check runs before any URL is
//! built, so a missing credential can never produce an outbound call.

use std::fmt;

use reqwest::Url;

use crate::{
    endpoints::{EndpointTable, RelayMode},
    error::{RelayError, RelayResult},
};

/// Query parameter the credential is embedded in
pub const CREDENTIAL_QUERY_PARAM: &str = "key";

/// A fully-formed upstream target.
///
/// `Debug` and `Display` print the redacted URL; only [`url`](Self::url)
/// exposes the credential.
#[derive(Clone)]
pub struct ResolvedEndpoint {
    pub target_id: String,
    pub mode: RelayMode,
    url: Url,
}

impl ResolvedEndpoint {
    /// The URL to call, credential included
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The URL with the credential value masked, safe for logs
    pub fn redacted_url(&self) -> String {
        let mut redacted = self.url.clone();
        let pairs: Vec<(String, String)> = self
            .url
            .query_pairs()
            .map(|(k, v)| {
                let v = if k == CREDENTIAL_QUERY_PARAM {
                    "REDACTED".to_string()
                } else {
                    v.into_owned()
                };
                (k.into_owned(), v)
            })
            .collect();
        redacted.query_pairs_mut().clear().extend_pairs(pairs);
        redacted.to_string()
    }
}

impl fmt::Debug for ResolvedEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedEndpoint")
            .field("target_id", &self.target_id)
            .field("mode", &self.mode)
            .field("url", &self.redacted_url())
            .finish()
    }
}

impl fmt::Display for ResolvedEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted_url())
    }
}

/// Maps target identifiers to upstream URLs
pub struct EndpointResolver<'a> {
    table: &'a EndpointTable,
}

impl<'a> EndpointResolver<'a> {
    pub fn new(table: &'a EndpointTable) -> Self {
        Self { table }
    }

    /// Resolve `target_id` against the table, embedding `credential`.
    ///
    /// Fails with [`RelayError::Configuration`] when the credential is absent
    /// or blank, and with [`RelayError::UnknownTarget`] when the identifier
    /// is not in the table.
    pub fn resolve(
        &self,
        target_id: &str,
        credential: Option<&str>,
    ) -> RelayResult<ResolvedEndpoint> {
        let credential = credential
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(RelayError::Configuration)?;

        let spec = self
            .table
            .get(target_id)
            .ok_or_else(|| RelayError::UnknownTarget(target_id.to_string()))?;

        let mut url = Url::parse(&spec.url).map_err(|e| {
            RelayError::Internal(anyhow::anyhow!(
                "Endpoint URL for '{}' is invalid: {}",
                target_id,
                e
            ))
        })?;
        url.query_pairs_mut()
            .append_pair(CREDENTIAL_QUERY_PARAM, credential);

        Ok(ResolvedEndpoint {
            target_id: target_id.to_string(),
            mode: spec.mode,
            url,
        })
    }
}
