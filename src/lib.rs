//! Genrelay - credential-injecting relay for a generative-content API
//!
//! Accepts `{targetId, payload}` from a client, attaches the server-held
//! credential, forwards the payload verbatim to the matching upstream
//! endpoint and relays the answer back either as one JSON document or as
//! an incremental event stream.

pub mod config;
pub mod credential;
pub mod endpoints;
pub mod error;
pub mod proxy;
pub mod relay;
pub mod routes;
pub mod streaming;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tracing::info;

pub use crate::config::Config;
pub use crate::credential::{CredentialSource, EnvCredential, StaticCredential};
pub use crate::endpoints::{EndpointSpec, EndpointTable, RelayMode};
pub use crate::error::{RelayError, RelayResult};
pub use crate::proxy::{Dispatch, UpstreamDispatcher};

/// Application state shared across all request handlers
///
/// Holds only immutable configuration and shared handles; nothing here is
/// mutated by an invocation.
pub struct AppState {
    pub config: Config,
    pub start_time: Instant,
    /// Target identifier to upstream endpoint, fixed at startup
    pub endpoints: Arc<EndpointTable>,
    /// Read on every invocation
    pub credentials: Arc<dyn CredentialSource>,
    /// Performs the outbound call
    pub dispatcher: Arc<dyn Dispatch>,
}

impl AppState {
    /// Create a new application state
    pub fn new(config: Config) -> Result<Self> {
        let endpoints = match &config.endpoints_file {
            Some(path) => {
                info!(path = %path.display(), "Loading endpoint table from file");
                EndpointTable::from_json_file(path)?
            }
            None => EndpointTable::builtin(&config.upstream_base_url)?,
        };

        // Initialize HTTP client with connection pooling
        let mut builder = reqwest::Client::builder().pool_max_idle_per_host(100);
        if let Some(timeout) = config.upstream_timeout() {
            builder = builder.read_timeout(timeout);
        }
        if let Some(timeout) = config.connect_timeout() {
            builder = builder.connect_timeout(timeout);
        }
        let http_client = builder.build()?;

        let credentials: Arc<dyn CredentialSource> =
            Arc::new(EnvCredential::new(config.credential_env_var.clone()));
        let dispatcher: Arc<dyn Dispatch> = Arc::new(UpstreamDispatcher::new(http_client));

        Ok(Self::from_parts(config, endpoints, credentials, dispatcher))
    }

    /// Assemble a state from explicit parts (embedding, tests)
    pub fn from_parts(
        config: Config,
        endpoints: EndpointTable,
        credentials: Arc<dyn CredentialSource>,
        dispatcher: Arc<dyn Dispatch>,
    ) -> Self {
        Self {
            config,
            start_time: Instant::now(),
            endpoints: Arc::new(endpoints),
            credentials,
            dispatcher,
        }
    }
}
