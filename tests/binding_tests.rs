use gantry::binding::{BindingPlan, BoundValue, Slot};
use gantry::decorator::{run_chain, ChainOutcome, Decorator, DecoratorValues, Verdict};
use gantry::http::HttpResponse;
use gantry::parser::RequestParser;
use gantry::HttpRequest;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn request(raw: &[u8]) -> HttpRequest {
    RequestParser::new(raw).parse().unwrap()
}

#[test]
fn test_query_slot_coerces_scalars() {
    let plan = BindingPlan::new(vec![
        Slot::query("limit"),
        Slot::query("verbose"),
        Slot::query("name"),
    ]);
    let req = request(b"GET /items?limit=25&verbose=true&name=widget HTTP/1.1\r\n\r\n");
    let args = plan.bind(&req, &DecoratorValues::default());
    assert_eq!(args.get::<i64>("limit"), Some(25));
    assert_eq!(args.get::<bool>("verbose"), Some(true));
    assert_eq!(args.get::<String>("name"), Some("widget".to_string()));
}

#[test]
fn test_multi_value_query_binds_as_array() {
    let plan = BindingPlan::new(vec![Slot::query("ids")]);
    let req = request(b"GET /items?ids=1,2,3 HTTP/1.1\r\n\r\n");
    let args = plan.bind(&req, &DecoratorValues::default());
    assert_eq!(args.get::<Vec<i64>>("ids"), Some(vec![1, 2, 3]));
}

#[test]
fn test_bare_query_param_is_missing_without_default() {
    let plan = BindingPlan::new(vec![Slot::query("flag")]);
    let req = request(b"GET /items?flag HTTP/1.1\r\n\r\n");
    let args = plan.bind(&req, &DecoratorValues::default());
    assert_eq!(args.value("flag"), Some(&BoundValue::Missing));
}

#[test]
fn test_default_fills_absent_slot() {
    let plan = BindingPlan::new(vec![Slot::query("limit").with_default(json!(10))]);
    let req = request(b"GET /items HTTP/1.1\r\n\r\n");
    let args = plan.bind(&req, &DecoratorValues::default());
    assert_eq!(args.get::<i64>("limit"), Some(10));
}

#[test]
fn test_supplied_value_beats_default() {
    let plan = BindingPlan::new(vec![Slot::query("limit").with_default(json!(10))]);
    let req = request(b"GET /items?limit=50 HTTP/1.1\r\n\r\n");
    let args = plan.bind(&req, &DecoratorValues::default());
    assert_eq!(args.get::<i64>("limit"), Some(50));
}

#[test]
fn test_path_variable_slot() {
    let plan = BindingPlan::new(vec![Slot::path_variable("id")]);
    let mut req = request(b"GET /items/60f1b2 HTTP/1.1\r\n\r\n");
    req.path_variables.insert("id".to_string(), "60f1b2".to_string());
    let args = plan.bind(&req, &DecoratorValues::default());
    // hex-looking identifiers stay strings
    assert_eq!(args.get::<String>("id"), Some("60f1b2".to_string()));
}

#[test]
fn test_json_body_slot() {
    let plan = BindingPlan::new(vec![Slot::body("payload")]);
    let req = request(b"POST /items HTTP/1.1\r\n\r\n{\"name\":\"widget\",\"price\":4}");
    let args = plan.bind(&req, &DecoratorValues::default());
    assert_eq!(
        args.get::<serde_json::Value>("payload"),
        Some(json!({"name": "widget", "price": 4}))
    );
}

#[test]
fn test_non_json_body_falls_back_to_text() {
    let plan = BindingPlan::new(vec![Slot::body("payload")]);
    let req = request(b"POST /items HTTP/1.1\r\n\r\nplain text");
    let args = plan.bind(&req, &DecoratorValues::default());
    assert_eq!(args.get::<String>("payload"), Some("plain text".to_string()));
}

#[test]
fn test_raw_body_slot_keeps_bytes() {
    let plan = BindingPlan::new(vec![Slot::raw_body("payload")]);
    let req = request(b"POST /items HTTP/1.1\r\n\r\n\x00\x01\x02");
    let args = plan.bind(&req, &DecoratorValues::default());
    assert_eq!(args.bytes("payload"), Some(&[0u8, 1, 2][..]));
}

/// Counts evaluations so ordering and short-circuiting are observable.
struct CountingDecorator {
    key: &'static str,
    halt: bool,
    evaluations: Arc<AtomicUsize>,
}

impl Decorator for CountingDecorator {
    fn key(&self) -> &'static str {
        self.key
    }

    fn evaluate(&self, _request: &HttpRequest, _body: Option<&Value>) -> Verdict {
        self.evaluations.fetch_add(1, Ordering::SeqCst);
        if self.halt {
            Verdict::Halt(Some(json!("stopped")))
        } else {
            Verdict::Proceed(Some(json!(self.key)))
        }
    }
}

#[test]
fn test_chain_halt_skips_later_decorators() {
    let first_runs = Arc::new(AtomicUsize::new(0));
    let second_runs = Arc::new(AtomicUsize::new(0));
    let chain: Vec<Arc<dyn Decorator>> = vec![
        Arc::new(CountingDecorator {
            key: "first",
            halt: true,
            evaluations: Arc::clone(&first_runs),
        }),
        Arc::new(CountingDecorator {
            key: "second",
            halt: false,
            evaluations: Arc::clone(&second_runs),
        }),
    ];
    let req = request(b"GET / HTTP/1.1\r\n\r\n");
    let mut res = HttpResponse::internal_error();
    let outcome = run_chain(&chain, &req, &mut res);
    assert!(matches!(outcome, ChainOutcome::Halted(_)));
    assert_eq!(first_runs.load(Ordering::SeqCst), 1);
    assert_eq!(second_runs.load(Ordering::SeqCst), 0);
}

#[test]
fn test_chain_collects_values_in_order() {
    let runs = Arc::new(AtomicUsize::new(0));
    let chain: Vec<Arc<dyn Decorator>> = vec![
        Arc::new(CountingDecorator {
            key: "first",
            halt: false,
            evaluations: Arc::clone(&runs),
        }),
        Arc::new(CountingDecorator {
            key: "second",
            halt: false,
            evaluations: Arc::clone(&runs),
        }),
    ];
    let req = request(b"GET / HTTP/1.1\r\n\r\n");
    let mut res = HttpResponse::internal_error();
    let ChainOutcome::Proceed(values) = run_chain(&chain, &req, &mut res) else {
        panic!("expected proceed");
    };
    assert_eq!(runs.load(Ordering::SeqCst), 2);
    assert_eq!(values.get("first"), Some(&json!("first")));
    assert_eq!(values.get("second"), Some(&json!("second")));
}

#[test]
fn test_decorator_value_slot() {
    let plan = BindingPlan::new(vec![Slot::decorator_value("token", "token_factory")]);
    let req = request(b"POST /login HTTP/1.1\r\n\r\n");
    let mut values = DecoratorValues::default();
    values.insert("token_factory", json!("abc.def.ghi"));
    let args = plan.bind(&req, &values);
    assert_eq!(args.get::<String>("token"), Some("abc.def.ghi".to_string()));
}
