//! Proxy module
//!
//! Handles the outbound call to the upstream API.

pub mod dispatcher;
pub mod headers;
pub mod logging;

pub use dispatcher::{ByteStream, Dispatch, UpstreamDispatcher, UpstreamResponse};
pub use logging::RequestContext;
