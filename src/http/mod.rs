//! Wire value objects shared by every layer.
//!
//! [`HttpRequest`] is immutable once parsed and cloned before handler
//! execution; [`HttpResponse`] stays mutable until the transport serializes
//! it. Method and status vocabulary come from the `http` crate; the closed
//! set of methods the parser accepts lives with the parser itself.

mod content_type;
mod request;
mod response;

pub use content_type::ContentType;
pub use request::{HttpRequest, QueryValue};
pub use response::HttpResponse;
