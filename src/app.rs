//! Application facade: route registration and server startup.
//!
//! An [`App`] collects routes through a small builder, then hands the
//! finished table to the transport. Everything about a route — method, path
//! template, content type, header constraints, decorator chain and binding
//! plan — is fixed here, before the listener binds; nothing is discovered at
//! request time.
//!
//! ```no_run
//! use gantry::app::App;
//! use gantry::binding::{Payload, Slot};
//! use gantry::config::ServerConfig;
//! use serde_json::json;
//!
//! let mut app = App::new(ServerConfig::from_env());
//! app.get("/items/{id}")
//!     .slot(Slot::path_variable("id"))
//!     .handler(|_req, _res, args| {
//!         Ok(Payload::Json(json!({ "id": args.get::<String>("id") })))
//!     })?;
//! app.start()?.join();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::binding::{BindingPlan, BoundArgs, Handler, Payload, Slot};
use crate::config::ServerConfig;
use crate::decorator::Decorator;
use crate::error::RegistrationError;
use crate::http::{ContentType, HttpRequest, HttpResponse};
use crate::router::{Endpoint, EndpointMap};
use crate::server::{HttpServer, RequestPipeline, ServerHandle};
use crate::static_files::StaticFiles;
use http::Method;
use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use tracing::info;

/// A configured application: route table plus transport settings.
pub struct App {
    config: ServerConfig,
    endpoints: EndpointMap,
}

impl App {
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            endpoints: EndpointMap::new(),
        }
    }

    /// Begin registering a route for an arbitrary method.
    pub fn route(&mut self, method: Method, route: &str) -> RouteBuilder<'_> {
        RouteBuilder {
            app: self,
            method,
            route: route.to_string(),
            content_type: ContentType::Json,
            match_headers: HashMap::new(),
            decorators: Vec::new(),
            slots: Vec::new(),
        }
    }

    pub fn get(&mut self, route: &str) -> RouteBuilder<'_> {
        self.route(Method::GET, route)
    }

    pub fn post(&mut self, route: &str) -> RouteBuilder<'_> {
        self.route(Method::POST, route)
    }

    pub fn put(&mut self, route: &str) -> RouteBuilder<'_> {
        self.route(Method::PUT, route)
    }

    pub fn patch(&mut self, route: &str) -> RouteBuilder<'_> {
        self.route(Method::PATCH, route)
    }

    pub fn delete(&mut self, route: &str) -> RouteBuilder<'_> {
        self.route(Method::DELETE, route)
    }

    /// Number of registered routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.endpoints.len()
    }

    /// Freeze the route table and start serving.
    pub fn start(self) -> io::Result<ServerHandle> {
        info!(routes = self.endpoints.len(), "starting server");
        let statics = StaticFiles::new(self.config.static_root.clone(), self.config.static_index.clone());
        let pipeline = Arc::new(RequestPipeline::new(Arc::new(self.endpoints), statics));
        HttpServer::new(self.config).start(pipeline)
    }
}

/// Builder for one route; consumed by [`RouteBuilder::handler`], which
/// registers the finished endpoint.
pub struct RouteBuilder<'a> {
    app: &'a mut App,
    method: Method,
    route: String,
    content_type: ContentType,
    match_headers: HashMap<String, String>,
    decorators: Vec<Arc<dyn Decorator>>,
    slots: Vec<Slot>,
}

impl RouteBuilder<'_> {
    /// Response content type; defaults to JSON.
    #[must_use]
    pub fn content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    /// Require a header to be present with exactly this value for the route
    /// to match.
    #[must_use]
    pub fn match_header(mut self, name: &str, value: &str) -> Self {
        self.match_headers.insert(name.to_string(), value.to_string());
        self
    }

    /// Append a decorator; chains run in attachment order.
    #[must_use]
    pub fn decorate(mut self, decorator: Arc<dyn Decorator>) -> Self {
        self.decorators.push(decorator);
        self
    }

    /// Append a binding slot; handlers read them from [`BoundArgs`] by name.
    #[must_use]
    pub fn slot(mut self, slot: Slot) -> Self {
        self.slots.push(slot);
        self
    }

    /// Attach the handler and register the endpoint.
    pub fn handler<F>(self, handler: F) -> Result<(), RegistrationError>
    where
        F: Fn(&HttpRequest, &mut HttpResponse, &BoundArgs) -> anyhow::Result<Payload>
            + Send
            + Sync
            + 'static,
    {
        self.register(Arc::new(handler))
    }

    /// Like [`RouteBuilder::handler`] but for an already-boxed handler.
    pub fn register(self, handler: Arc<dyn Handler>) -> Result<(), RegistrationError> {
        let endpoint = Endpoint::new(
            &self.route,
            self.method,
            self.content_type,
            self.match_headers,
            self.decorators,
            BindingPlan::new(self.slots),
            handler,
        )?;
        self.app.endpoints.add_route(endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ok_handler(
        _req: &HttpRequest,
        _res: &mut HttpResponse,
        _args: &BoundArgs,
    ) -> anyhow::Result<Payload> {
        Ok(Payload::Json(json!({})))
    }

    #[test]
    fn test_routes_register() {
        let mut app = App::new(ServerConfig::default());
        app.get("/a").handler(ok_handler).unwrap();
        app.post("/a").handler(ok_handler).unwrap();
        app.get("/b/{id}").handler(ok_handler).unwrap();
        assert_eq!(app.route_count(), 3);
    }

    #[test]
    fn test_duplicate_route_rejected() {
        let mut app = App::new(ServerConfig::default());
        app.get("/a").handler(ok_handler).unwrap();
        let err = app.get("a/").handler(ok_handler).unwrap_err();
        assert!(matches!(err, RegistrationError::DuplicateRoute { .. }));
    }
}
