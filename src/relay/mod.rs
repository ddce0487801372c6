//! Relay pipeline
//!
//! RequestValidator → EndpointResolver → Dispatch → ResponseRelay. Each
//! stage returns a [`crate::error::RelayResult`]; only the streaming stage
//! of [`ResponseRelay`] can fail after output reached the caller.

pub mod delivery;
pub mod resolver;
pub mod validator;

pub use delivery::{RelayState, ResponseRelay};
pub use resolver::{EndpointResolver, ResolvedEndpoint};
pub use validator::{InboundRequest, RequestValidator, ValidatedRequest};
