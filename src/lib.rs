//! # Gantry
//!
//! **Gantry** is a small embedded web framework over a raw blocking TCP
//! transport: a hand-written HTTP/1.1 parser, a route table mixing exact and
//! templated paths, registration-time parameter binding, an explicit
//! decorator (middleware) chain with JWT issuance and verification, and a
//! persistent token blacklist with a background purge worker.
//!
//! ## Architecture
//!
//! - **[`parser`]** - cursor-based HTTP/1.1 request parsing
//! - **[`http`]** - request/response types and the content-type table
//! - **[`router`]** - endpoint registration and exact/templated resolution
//! - **[`binding`]** - per-route binding plans filling handler arguments
//! - **[`decorator`]** - the middleware protocol and chain runner
//! - **[`security`]** - JWT issuance and verification decorators
//! - **[`blacklist`]** - token revocation set with its purge worker
//! - **[`static_files`]** - static file fallback for unmatched routes
//! - **[`server`]** - blocking TCP transport and the request pipeline
//! - **[`app`]** - the registration facade tying it all together
//!
//! ## Request lifecycle
//!
//! Each accepted connection carries exactly one request/response cycle on
//! its own thread: the transport reads one framed message (headers to the
//! blank line, then `Content-Length` body bytes), the parser produces an
//! immutable [`http::HttpRequest`], the router resolves an endpoint or the
//! request falls through to static files, the endpoint's decorator chain
//! runs (a halt short-circuits straight to serialization), the binding plan
//! assembles handler arguments, the handler returns a payload, and the
//! response is written followed by a write half-close. There is no
//! keep-alive.
//!
//! ## Quick start
//!
//! ```no_run
//! use gantry::app::App;
//! use gantry::binding::Payload;
//! use gantry::config::ServerConfig;
//! use serde_json::json;
//!
//! let mut app = App::new(ServerConfig::from_env());
//! app.get("/health")
//!     .handler(|_req, _res, _args| Ok(Payload::Json(json!({"status": "ok"}))))?;
//! app.start()?.join();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod app;
pub mod binding;
pub mod blacklist;
pub mod config;
pub mod decorator;
pub mod error;
pub mod http;
pub mod parser;
pub mod router;
pub mod security;
pub mod server;
pub mod static_files;

pub use app::App;
pub use binding::{BoundArgs, Payload, Slot};
pub use config::ServerConfig;
pub use decorator::{Decorator, Verdict};
pub use error::{ParseError, RegistrationError, StoreError};
pub use http::{ContentType, HttpRequest, HttpResponse};
pub use security::{AuthenticationResult, JwtConfig};
pub use server::ServerHandle;
