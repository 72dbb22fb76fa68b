use super::endpoint::{normalize_path, Endpoint};
use crate::error::RegistrationError;
use crate::http::HttpRequest;
use http::Method;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Route table: method → {exact route string → endpoint}, plus the
/// templated endpoints for that method in registration order.
///
/// Built once before the transport starts accepting and read-only after, so
/// concurrent request threads resolve routes without a lock.
#[derive(Default)]
pub struct EndpointMap {
    exact: HashMap<Method, HashMap<String, Arc<Endpoint>>>,
    templated: HashMap<Method, Vec<Arc<Endpoint>>>,
    route_count: usize,
}

impl EndpointMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an endpoint. Rejects an identical (method, exact route
    /// string) pair — ambiguity between shape-identical templates is the
    /// registrar's problem, not the matcher's.
    pub fn add_route(&mut self, endpoint: Endpoint) -> Result<(), RegistrationError> {
        let method = endpoint.method().clone();
        let route = endpoint.route().to_string();
        let by_route = self.exact.entry(method.clone()).or_default();
        if by_route.contains_key(&route) {
            return Err(RegistrationError::DuplicateRoute { method, route });
        }
        let endpoint = Arc::new(endpoint);
        if endpoint.has_route_variables() {
            self.templated
                .entry(method.clone())
                .or_default()
                .push(Arc::clone(&endpoint));
        }
        by_route.insert(route.clone(), endpoint);
        self.route_count += 1;
        debug!(method = %method, route = %route, "route registered");
        Ok(())
    }

    /// Number of registered endpoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.route_count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.route_count == 0
    }

    /// Resolve a request: exact lookup on the normalized URL first, then a
    /// linear scan over that method's templated endpoints in registration
    /// order. Header constraints must hold for either to win.
    #[must_use]
    pub fn resolve(
        &self,
        request: &HttpRequest,
    ) -> Option<(Arc<Endpoint>, HashMap<String, String>)> {
        let url = normalize_path(&request.path);

        if let Some(endpoint) = self
            .exact
            .get(&request.method)
            .and_then(|routes| routes.get(&url))
        {
            if !endpoint.has_route_variables() && endpoint.matches_headers(request) {
                info!(method = %request.method, url = %url, route = %endpoint.route(), "route matched");
                return Some((Arc::clone(endpoint), HashMap::new()));
            }
        }

        if let Some(templated) = self.templated.get(&request.method) {
            for endpoint in templated {
                if let Some(variables) = endpoint.matches_url(&url) {
                    if endpoint.matches_headers(request) {
                        info!(
                            method = %request.method,
                            url = %url,
                            route = %endpoint.route(),
                            path_variables = ?variables,
                            "route matched"
                        );
                        return Some((Arc::clone(endpoint), variables));
                    }
                }
            }
        }

        warn!(method = %request.method, url = %url, "no route matched");
        None
    }
}
