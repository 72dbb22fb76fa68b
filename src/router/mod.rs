//! Route table: static and templated paths.
//!
//! An [`Endpoint`] pairs a normalized route template with its method, header
//! constraints, decorator list, binding plan and handler. The
//! [`EndpointMap`] resolves requests with an O(1) exact lookup first and a
//! linear scan over compiled templates second; it is frozen before the
//! transport starts, so request threads share it without locking.

mod endpoint;
mod map;

pub use endpoint::{normalize_path, Endpoint};
pub use map::EndpointMap;
