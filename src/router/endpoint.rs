use crate::binding::{BindingPlan, Handler};
use crate::decorator::Decorator;
use crate::error::RegistrationError;
use crate::http::{ContentType, HttpRequest};
use http::Method;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

/// Compiled template matcher for a route with `{name}` segments.
///
/// Built once at registration: each literal segment is escaped, each
/// variable segment becomes a `([^/]+)` capture. Anchoring plus per-segment
/// captures means a URL with a different segment count can never match.
struct RouteTemplate {
    regex: Regex,
    param_names: Vec<String>,
}

/// A registered (method, path template) → handler binding, together with
/// its decorators, binding plan and header constraints.
pub struct Endpoint {
    route: String,
    method: Method,
    content_type: ContentType,
    match_headers: HashMap<String, String>,
    decorators: Vec<Arc<dyn Decorator>>,
    plan: BindingPlan,
    handler: Arc<dyn Handler>,
    template: Option<RouteTemplate>,
}

/// Normalize a route or URL to have a leading and trailing slash.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    let mut out = String::with_capacity(path.len() + 2);
    if !path.starts_with('/') {
        out.push('/');
    }
    out.push_str(path);
    if !out.ends_with('/') {
        out.push('/');
    }
    out
}

fn compile_template(route: &str) -> Result<Option<RouteTemplate>, RegistrationError> {
    if !route.contains('{') {
        return Ok(None);
    }
    let mut pattern = String::with_capacity(route.len() + 8);
    pattern.push('^');
    let mut param_names = Vec::new();
    for segment in route.split('/').filter(|s| !s.is_empty()) {
        if segment.starts_with('{') && segment.ends_with('}') {
            param_names.push(segment[1..segment.len() - 1].to_string());
            pattern.push_str("/([^/]+)");
        } else {
            pattern.push('/');
            pattern.push_str(&regex::escape(segment));
        }
    }
    pattern.push_str("/$");
    let regex = Regex::new(&pattern).map_err(|source| RegistrationError::InvalidRoute {
        route: route.to_string(),
        source,
    })?;
    Ok(Some(RouteTemplate { regex, param_names }))
}

impl Endpoint {
    pub fn new(
        route: &str,
        method: Method,
        content_type: ContentType,
        match_headers: HashMap<String, String>,
        decorators: Vec<Arc<dyn Decorator>>,
        plan: BindingPlan,
        handler: Arc<dyn Handler>,
    ) -> Result<Self, RegistrationError> {
        let route = normalize_path(route);
        let template = compile_template(&route)?;
        Ok(Self {
            route,
            method,
            content_type,
            match_headers,
            decorators,
            plan,
            handler,
            template,
        })
    }

    /// Normalized route string, e.g. `/business/{id}/item/{item_id}/`.
    #[must_use]
    pub fn route(&self) -> &str {
        &self.route
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    #[must_use]
    pub fn decorators(&self) -> &[Arc<dyn Decorator>] {
        &self.decorators
    }

    #[must_use]
    pub fn plan(&self) -> &BindingPlan {
        &self.plan
    }

    #[must_use]
    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }

    #[must_use]
    pub fn has_route_variables(&self) -> bool {
        self.template.is_some()
    }

    /// Match a normalized URL against this endpoint's template, capturing
    /// variable segments by name. Static routes compare for equality.
    #[must_use]
    pub fn matches_url(&self, normalized_url: &str) -> Option<HashMap<String, String>> {
        match &self.template {
            None => (normalized_url == self.route).then(HashMap::new),
            Some(template) => {
                let captures = template.regex.captures(normalized_url)?;
                let mut variables = HashMap::with_capacity(template.param_names.len());
                for (i, name) in template.param_names.iter().enumerate() {
                    variables.insert(name.clone(), captures.get(i + 1)?.as_str().to_string());
                }
                Some(variables)
            }
        }
    }

    /// Every declared header must be present with an equal value.
    #[must_use]
    pub fn matches_headers(&self, request: &HttpRequest) -> bool {
        self.match_headers
            .iter()
            .all(|(name, value)| request.header(name) == Some(value.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::Payload;

    fn endpoint(route: &str) -> Endpoint {
        Endpoint::new(
            route,
            Method::GET,
            ContentType::Json,
            HashMap::new(),
            Vec::new(),
            BindingPlan::default(),
            Arc::new(|_: &HttpRequest, _: &mut crate::http::HttpResponse, _: &crate::binding::BoundArgs| {
                Ok(Payload::Empty)
            }),
        )
        .unwrap()
    }

    #[test]
    fn test_route_normalization() {
        assert_eq!(endpoint("login").route(), "/login/");
        assert_eq!(endpoint("/login/").route(), "/login/");
        assert_eq!(endpoint("").route(), "/");
    }

    #[test]
    fn test_template_extracts_variables() {
        let e = endpoint("/business/{id}/item/{item_id}");
        let vars = e.matches_url("/business/60f/item/9ab/").unwrap();
        assert_eq!(vars.get("id").map(String::as_str), Some("60f"));
        assert_eq!(vars.get("item_id").map(String::as_str), Some("9ab"));
    }

    #[test]
    fn test_segment_count_mismatch_never_matches() {
        let e = endpoint("/business/{id}/item/{item_id}");
        assert!(e.matches_url("/business/60f/item/").is_none());
        assert!(e.matches_url("/business/60f/item/9ab/extra/").is_none());
    }
}
