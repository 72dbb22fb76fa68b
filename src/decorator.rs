//! Decorator (middleware) protocol and chain runner.
//!
//! Decorators attach to a route as an explicit ordered list fixed at
//! registration, outermost first. The chain runs before parameter binding
//! and before the handler body; a [`Verdict::Halt`] short-circuits the whole
//! pipeline and the decorator's `on_fail` output becomes the response body
//! with whatever status the decorator set. Values produced by successful
//! decorators land in a [`DecoratorValues`] map keyed by each decorator's
//! [`Decorator::key`], so a handler can declare a slot for, say, the
//! authenticated principal without re-deriving it.

use crate::http::{HttpRequest, HttpResponse};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Outcome of one decorator evaluation.
#[derive(Debug, Clone)]
pub enum Verdict {
    /// Keep going; an optional value is recorded under the decorator's key.
    Proceed(Option<Value>),
    /// Abort the pipeline; the optional detail (e.g. a reason code) is
    /// passed back to `on_fail`.
    Halt(Option<Value>),
}

/// A middleware unit that may veto or annotate a request before the handler
/// runs.
pub trait Decorator: Send + Sync {
    /// Stable key identifying this decorator's produced value in
    /// [`DecoratorValues`] and in binding slots.
    fn key(&self) -> &'static str;

    /// Decide whether the pipeline continues. Pure with respect to the
    /// request; `body` is the pre-decoded JSON body, if any.
    fn evaluate(&self, request: &HttpRequest, body: Option<&Value>) -> Verdict;

    /// Build the failure response body after this decorator halted. The
    /// default leaves the response untouched and the body empty.
    fn on_fail(
        &self,
        _request: &HttpRequest,
        _response: &mut HttpResponse,
        _detail: Option<&Value>,
    ) -> Vec<u8> {
        Vec::new()
    }
}

/// Tagged result map carried explicitly through the pipeline.
#[derive(Debug, Clone, Default)]
pub struct DecoratorValues {
    values: HashMap<&'static str, Value>,
}

impl DecoratorValues {
    pub fn insert(&mut self, key: &'static str, value: Value) {
        self.values.insert(key, value);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }
}

/// Result of running a route's full decorator chain.
pub enum ChainOutcome {
    /// Every decorator proceeded; their values are available for binding.
    Proceed(DecoratorValues),
    /// A decorator halted; its `on_fail` output is the response body.
    Halted(Vec<u8>),
}

/// Run the chain in attachment order. The body is decoded once and shared;
/// a halt stops the chain immediately — later decorators never run.
pub fn run_chain(
    decorators: &[Arc<dyn Decorator>],
    request: &HttpRequest,
    response: &mut HttpResponse,
) -> ChainOutcome {
    let body = request.json_body();
    let mut values = DecoratorValues::default();
    for decorator in decorators {
        match decorator.evaluate(request, body.as_ref()) {
            Verdict::Proceed(Some(value)) => {
                debug!(key = decorator.key(), "decorator proceeded with value");
                values.insert(decorator.key(), value);
            }
            Verdict::Proceed(None) => {
                debug!(key = decorator.key(), "decorator proceeded");
            }
            Verdict::Halt(detail) => {
                debug!(key = decorator.key(), "decorator halted the pipeline");
                let body = decorator.on_fail(request, response, detail.as_ref());
                return ChainOutcome::Halted(body);
            }
        }
    }
    ChainOutcome::Proceed(values)
}
