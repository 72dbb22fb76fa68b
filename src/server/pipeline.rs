use crate::decorator::{run_chain, ChainOutcome};
use crate::http::HttpResponse;
use crate::parser::RequestParser;
use crate::router::EndpointMap;
use crate::static_files::StaticFiles;
use http::StatusCode;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error};

/// The per-request processing sequence, shared by every connection thread:
/// parse, resolve, decorate, bind, handle, serialize.
///
/// Holds only shared immutable state, so one instance serves the whole
/// process without locking.
pub struct RequestPipeline {
    endpoints: Arc<EndpointMap>,
    statics: StaticFiles,
}

impl RequestPipeline {
    #[must_use]
    pub fn new(endpoints: Arc<EndpointMap>, statics: StaticFiles) -> Self {
        Self { endpoints, statics }
    }

    /// Process one raw request message into wire-ready response bytes.
    ///
    /// A message that fails to parse gets a bodyless 500; everything else
    /// flows through routing, with the static fallback covering unmatched
    /// URLs. `received_at` feeds the `Server-Timing` response header.
    #[must_use]
    pub fn handle(&self, message: &[u8], received_at: Instant) -> Vec<u8> {
        let request = match RequestParser::new(message).parse() {
            Ok(request) => request,
            Err(e) => {
                error!(error = %e, "request failed to parse");
                return HttpResponse::internal_error().serialize(Some(received_at));
            }
        };

        let response = match self.endpoints.resolve(&request) {
            Some((endpoint, path_variables)) => {
                let mut request = request;
                request.path_variables = path_variables;
                self.execute(&endpoint, &request)
            }
            None => self.statics.respond(&request),
        };
        response.serialize(Some(received_at))
    }

    fn execute(
        &self,
        endpoint: &crate::router::Endpoint,
        request: &crate::http::HttpRequest,
    ) -> HttpResponse {
        let mut response = HttpResponse::new(
            endpoint.content_type(),
            &request.version,
            StatusCode::OK,
            Vec::new(),
        );

        let values = match run_chain(endpoint.decorators(), request, &mut response) {
            ChainOutcome::Proceed(values) => values,
            ChainOutcome::Halted(body) => {
                debug!(route = endpoint.route(), "pipeline halted by decorator");
                response.body = body;
                return response;
            }
        };

        let args = endpoint.plan().bind(request, &values);
        match endpoint.handler().handle(request, &mut response, &args) {
            Ok(payload) => {
                response.body = payload.into_bytes();
                response
            }
            Err(e) => {
                error!(route = endpoint.route(), error = %e, "handler failed");
                HttpResponse::empty_status(request, StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{BindingPlan, BoundArgs, Payload, Slot};
    use crate::http::{ContentType, HttpRequest};
    use crate::router::Endpoint;
    use http::Method;
    use serde_json::json;
    use std::collections::HashMap;

    fn pipeline_with(endpoint: Endpoint) -> RequestPipeline {
        let mut map = EndpointMap::new();
        map.add_route(endpoint).unwrap();
        RequestPipeline::new(Arc::new(map), StaticFiles::new("static", "/index.html"))
    }

    #[test]
    fn test_malformed_message_yields_500() {
        let pipeline = RequestPipeline::new(
            Arc::new(EndpointMap::new()),
            StaticFiles::new("static", "/index.html"),
        );
        let out = pipeline.handle(b"BREW /coffee HTTP/1.1\r\n\r\n", Instant::now());
        assert!(out.starts_with(b"HTTP/1.1 500 "));
    }

    #[test]
    fn test_handler_payload_becomes_body() {
        let endpoint = Endpoint::new(
            "/items/{id}",
            Method::GET,
            ContentType::Json,
            HashMap::new(),
            Vec::new(),
            BindingPlan::new(vec![Slot::path_variable("id")]),
            Arc::new(
                |_: &HttpRequest, _: &mut HttpResponse, args: &BoundArgs| {
                    Ok(Payload::Json(json!({ "id": args.get::<i64>("id") })))
                },
            ),
        )
        .unwrap();
        let out = pipeline_with(endpoint).handle(b"GET /items/7 HTTP/1.1\r\n\r\n", Instant::now());
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.ends_with(r#"{"id":7}"#));
    }

    #[test]
    fn test_unmatched_route_falls_through_to_statics() {
        let pipeline = RequestPipeline::new(
            Arc::new(EndpointMap::new()),
            StaticFiles::new("definitely-missing-dir", "/index.html"),
        );
        let out = pipeline.handle(b"GET /nowhere HTTP/1.1\r\n\r\n", Instant::now());
        assert!(out.starts_with(b"HTTP/1.1 404 "));
    }
}
