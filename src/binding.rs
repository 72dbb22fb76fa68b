//! Registration-time parameter binding.
//!
//! Instead of inspecting handler signatures at call time, every route
//! carries a fixed, ordered list of [`Slot`]s built when the route is
//! registered. Request-time binding is a straight loop over those slots:
//! each slot's extractor runs against the (already cloned) request, absent
//! or malformed input yields [`BoundValue::Missing`] — never an error — and
//! a declared default fills the gap. Handlers then read the assembled
//! [`BoundArgs`] with typed accessors; structured types are rebuilt from the
//! decoded JSON via serde.

use crate::decorator::DecoratorValues;
use crate::http::{HttpRequest, HttpResponse, QueryValue};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Where a slot's value comes from.
#[derive(Debug, Clone)]
pub enum SlotSource {
    /// A query parameter by name.
    Query(String),
    /// A path variable captured by the route template.
    PathVariable(String),
    /// The request body; `raw` keeps the bytes untouched instead of
    /// decoding JSON.
    Body { raw: bool },
    /// The value a decorator produced earlier in the chain, keyed by
    /// [`crate::decorator::Decorator::key`].
    DecoratorValue(&'static str),
}

/// One named handler argument and how to fill it.
#[derive(Debug, Clone)]
pub struct Slot {
    pub name: String,
    pub source: SlotSource,
    pub default: Option<Value>,
}

impl Slot {
    #[must_use]
    pub fn query(name: &str) -> Self {
        Self {
            name: name.to_string(),
            source: SlotSource::Query(name.to_string()),
            default: None,
        }
    }

    #[must_use]
    pub fn path_variable(name: &str) -> Self {
        Self {
            name: name.to_string(),
            source: SlotSource::PathVariable(name.to_string()),
            default: None,
        }
    }

    /// JSON-decoded request body.
    #[must_use]
    pub fn body(name: &str) -> Self {
        Self {
            name: name.to_string(),
            source: SlotSource::Body { raw: false },
            default: None,
        }
    }

    /// Request body bytes, verbatim.
    #[must_use]
    pub fn raw_body(name: &str) -> Self {
        Self {
            name: name.to_string(),
            source: SlotSource::Body { raw: true },
            default: None,
        }
    }

    /// Value produced by the decorator registered under `key`, e.g. the
    /// authenticated principal or a freshly minted token.
    #[must_use]
    pub fn decorator_value(name: &str, key: &'static str) -> Self {
        Self {
            name: name.to_string(),
            source: SlotSource::DecoratorValue(key),
            default: None,
        }
    }

    /// Fallback used when the extractor comes back empty.
    #[must_use]
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// A bound argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundValue {
    Json(Value),
    Bytes(Vec<u8>),
    Missing,
}

/// Arguments assembled for one handler invocation.
#[derive(Debug, Default)]
pub struct BoundArgs {
    values: Vec<(String, BoundValue)>,
}

impl BoundArgs {
    /// Typed lookup: deserializes the bound JSON into `T`. `None` when the
    /// slot is missing, holds raw bytes, or does not fit `T`.
    #[must_use]
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        match self.value(name)? {
            BoundValue::Json(v) => serde_json::from_value(v.clone()).ok(),
            _ => None,
        }
    }

    /// Raw access to the bound value.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&BoundValue> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Bytes of a raw-body slot.
    #[must_use]
    pub fn bytes(&self, name: &str) -> Option<&[u8]> {
        match self.value(name)? {
            BoundValue::Bytes(b) => Some(b.as_slice()),
            _ => None,
        }
    }
}

/// The fixed per-route binding plan.
#[derive(Debug, Clone, Default)]
pub struct BindingPlan {
    slots: Vec<Slot>,
}

impl BindingPlan {
    #[must_use]
    pub fn new(slots: Vec<Slot>) -> Self {
        Self { slots }
    }

    /// Fill every slot against the request and the decorator result map.
    #[must_use]
    pub fn bind(&self, request: &HttpRequest, decorator_values: &DecoratorValues) -> BoundArgs {
        let mut values = Vec::with_capacity(self.slots.len());
        for slot in &self.slots {
            let mut bound = extract(&slot.source, request, decorator_values);
            if matches!(bound, BoundValue::Missing) {
                if let Some(default) = &slot.default {
                    bound = BoundValue::Json(default.clone());
                }
            }
            values.push((slot.name.clone(), bound));
        }
        BoundArgs { values }
    }
}

fn extract(source: &SlotSource, request: &HttpRequest, values: &DecoratorValues) -> BoundValue {
    match source {
        SlotSource::Query(name) => match request.query_parameter(name) {
            Some(QueryValue::Values(vals)) if vals.len() == 1 => {
                BoundValue::Json(coerce_scalar(&vals[0]))
            }
            Some(QueryValue::Values(vals)) => {
                BoundValue::Json(Value::Array(vals.iter().map(|v| coerce_scalar(v)).collect()))
            }
            // present-without-value carries no data to bind
            Some(QueryValue::Bare) | None => BoundValue::Missing,
        },
        SlotSource::PathVariable(name) => match request.path_variable(name) {
            Some(v) => BoundValue::Json(coerce_scalar(v)),
            None => BoundValue::Missing,
        },
        SlotSource::Body { raw: true } => {
            if request.body.is_empty() {
                BoundValue::Missing
            } else {
                BoundValue::Bytes(request.body.clone())
            }
        }
        SlotSource::Body { raw: false } => {
            if request.body.is_empty() {
                BoundValue::Missing
            } else {
                match request.json_body() {
                    Some(v) => BoundValue::Json(v),
                    // non-JSON bodies fall back to their text form
                    None => BoundValue::Json(Value::String(
                        String::from_utf8_lossy(&request.body).into_owned(),
                    )),
                }
            }
        }
        SlotSource::DecoratorValue(key) => match values.get(key) {
            Some(v) => BoundValue::Json(v.clone()),
            None => BoundValue::Missing,
        },
    }
}

/// Scalar coercion for query/path strings: numbers, booleans and nested
/// JSON pass through typed, anything else stays a string.
fn coerce_scalar(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(v @ (Value::Number(_) | Value::Bool(_) | Value::Object(_) | Value::Array(_))) => v,
        _ => Value::String(raw.to_string()),
    }
}

/// What a handler hands back; serialized according to the response's
/// content type by the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
    Bytes(Vec<u8>),
    Empty,
}

impl Payload {
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Payload::Json(v) => serde_json::to_vec(&v).unwrap_or_default(),
            Payload::Text(s) => s.into_bytes(),
            Payload::Bytes(b) => b,
            Payload::Empty => Vec::new(),
        }
    }
}

/// A route's handler. Runs only after every decorator proceeded, so any
/// decorator-produced slot already holds an authorized value.
pub trait Handler: Send + Sync {
    fn handle(
        &self,
        request: &HttpRequest,
        response: &mut HttpResponse,
        args: &BoundArgs,
    ) -> anyhow::Result<Payload>;
}

impl<F> Handler for F
where
    F: Fn(&HttpRequest, &mut HttpResponse, &BoundArgs) -> anyhow::Result<Payload> + Send + Sync,
{
    fn handle(
        &self,
        request: &HttpRequest,
        response: &mut HttpResponse,
        args: &BoundArgs,
    ) -> anyhow::Result<Payload> {
        self(request, response, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_coercion() {
        assert_eq!(coerce_scalar("17"), json!(17));
        assert_eq!(coerce_scalar("true"), json!(true));
        assert_eq!(coerce_scalar("60f1b2"), json!("60f1b2"));
    }

    #[test]
    fn test_default_fills_missing() {
        let plan = BindingPlan::new(vec![Slot::query("limit").with_default(json!(10))]);
        let req = crate::parser::RequestParser::new(b"GET /items HTTP/1.1\r\n\r\n")
            .parse()
            .unwrap();
        let args = plan.bind(&req, &DecoratorValues::default());
        assert_eq!(args.get::<i64>("limit"), Some(10));
    }
}
