//! Blocking TCP transport and the per-request pipeline.
//!
//! [`HttpServer`] owns the listener and the accept loop; each accepted
//! connection gets its own thread, one request/response cycle, and a write
//! half-close when the response is out. [`RequestPipeline`] is the shared
//! request path every connection thread runs: parse the framed message,
//! resolve a route, run the decorator chain, bind parameters, invoke the
//! handler, serialize.

mod http_server;
mod pipeline;

pub use http_server::{HttpServer, ServerHandle};
pub use pipeline::RequestPipeline;
