//! Error taxonomy for the framework.
//!
//! Parse and registration failures are typed so callers can react at the
//! right layer: `ParseError` maps to a bodyless 500 at the transport,
//! `RegistrationError` surfaces during startup before the listener binds,
//! and `StoreError` wraps blacklist persistence faults. Handler-level
//! errors stay `anyhow::Error` and are only ever logged and mapped to 500.

use thiserror::Error;

/// Failure while scanning a raw request buffer.
///
/// The parser performs no recovery: any of these aborts the request and the
/// transport answers with an empty 500.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The buffer ended before the token being scanned was terminated.
    #[error("unexpected end of request at byte {0}")]
    UnexpectedEof(usize),
    /// The request-line method token is not in the supported set.
    #[error("unknown HTTP method {0:?}")]
    UnknownMethod(String),
    /// A header line had no `:` separator.
    #[error("malformed header line {0:?}")]
    MalformedHeader(String),
}

/// Failure while registering a route, reported at startup.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// An identical (method, exact route string) pair already exists.
    #[error("route already registered: {method} {route}")]
    DuplicateRoute { method: http::Method, route: String },
    /// The route template could not be compiled into a matcher.
    #[error("invalid route template {route:?}: {source}")]
    InvalidRoute {
        route: String,
        #[source]
        source: regex::Error,
    },
}

/// Failure in the blacklist persistence boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("blacklist store I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("blacklist document encoding: {0}")]
    Encoding(#[from] serde_json::Error),
}
