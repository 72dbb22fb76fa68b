use http::Method;
use serde_json::Value;
use std::collections::HashMap;

/// A query parameter's decoded value.
///
/// A bare name (`?flag`) is recorded as present-without-value rather than
/// omitted; a comma-joined value (`?ids=1,2,3`) becomes a multi-value list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    /// The parameter appeared with no `=value` part.
    Bare,
    /// One or more values, split on commas.
    Values(Vec<String>),
}

impl QueryValue {
    /// First value, if any value was supplied at all.
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        match self {
            QueryValue::Bare => None,
            QueryValue::Values(v) => v.first().map(String::as_str),
        }
    }
}

/// Immutable parsed HTTP request.
///
/// Produced once by the parser; the pipeline clones it before decorators and
/// the handler run so they can never corrupt the parser's view. Header names
/// are case-sensitive: the map holds exactly what was on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    /// HTTP method from the request line.
    pub method: Method,
    /// URL path, query string stripped.
    pub path: String,
    /// Protocol version token, e.g. `HTTP/1.1`.
    pub version: String,
    /// Header name → value, names case-sensitive, values left-trimmed.
    pub headers: HashMap<String, String>,
    /// Query parameter name → decoded value.
    pub query_params: HashMap<String, QueryValue>,
    /// Raw body bytes, possibly empty.
    pub body: Vec<u8>,
    /// Named segments captured by a templated route; empty until the router
    /// resolves the request.
    pub path_variables: HashMap<String, String>,
}

impl HttpRequest {
    /// Look up a header by its exact wire name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Look up a query parameter by name.
    #[must_use]
    pub fn query_parameter(&self, name: &str) -> Option<&QueryValue> {
        self.query_params.get(name)
    }

    /// Look up a captured path variable by name.
    #[must_use]
    pub fn path_variable(&self, name: &str) -> Option<&str> {
        self.path_variables.get(name).map(String::as_str)
    }

    /// Decode the body as JSON. `None` on an empty or non-JSON body; never
    /// an error, absence is ordinary here.
    #[must_use]
    pub fn json_body(&self) -> Option<Value> {
        if self.body.is_empty() {
            return None;
        }
        serde_json::from_slice(&self.body).ok()
    }
}
