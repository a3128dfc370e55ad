//! Dispatch behavior seen from outside: responders, validation, routing.

use heron::config::{BindingConfig, HeronConfig};
use heron::prelude::*;
use heron::Responder;
use heron_test::{RecordingMount, TestRequest};
use http::{Method, StatusCode};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug, Record, Serialize)]
struct Login {
    #[heron(body = "user")]
    user: String,
    #[heron(body = "password")]
    password: String,
}

#[derive(Debug, Record, Serialize)]
struct Lookup {
    #[heron(path = "id")]
    id: u64,
    #[heron(query = "verbose,false")]
    verbose: bool,
}

type Calls = Arc<Mutex<Vec<(Option<Value>, Option<String>)>>>;

fn recording() -> (Calls, impl Responder) {
    let calls: Calls = Arc::default();
    let sink = Arc::clone(&calls);
    let responder = move |_: &Exchange, data: Option<Value>, err: Option<&DispatchError>| {
        sink.lock().push((data, err.map(|e| e.error_code().to_string())));
    };
    (calls, responder)
}

fn login_schema() -> SchemaValidator {
    SchemaValidator::new().register(
        "Login",
        Schema::object([
            ("user", Schema::string().min_length(1).required()),
            ("password", Schema::string().min_length(8).required()),
        ]),
    )
}

#[test]
fn test_handler_data_reaches_responder() {
    let (calls, responder) = recording();
    let dispatcher = Dispatcher::builder().responder(responder).build();
    let endpoint = dispatcher.endpoint(|| Outcome::ok("ok"));

    let exchange = TestRequest::get("/").build().unwrap();
    assert_eq!(endpoint.call(&exchange), Dispatched::Responded);
    assert_eq!(*calls.lock(), [(Some(Value::from("ok")), None)]);
}

#[test]
fn test_validation_failure_skips_handler() {
    let (calls, responder) = recording();
    let invoked = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&invoked);
    let dispatcher = Dispatcher::builder()
        .validator(login_schema())
        .responder(responder)
        .build();
    let endpoint = dispatcher.endpoint(move |_: Login| {
        *counter.lock() += 1;
        "welcome"
    });

    let exchange = TestRequest::post("/login")
        .form([("user", "ada"), ("password", "short")])
        .build()
        .unwrap();

    assert_eq!(endpoint.call(&exchange), Dispatched::PlanFailed);
    assert_eq!(*invoked.lock(), 0);
    assert_eq!(
        *calls.lock(),
        [(None, Some("VALIDATION_FAILED".to_string()))]
    );
}

#[test]
fn test_validation_failure_envelope() {
    let dispatcher = Dispatcher::builder().validator(login_schema()).build();
    let endpoint = dispatcher.endpoint(|_: Login| "welcome");

    let exchange = TestRequest::post("/login")
        .header("x-request-id", "0191e3c4-6b1f-7cc0-a0f5-1a2b3c4d5e6f")
        .form([("user", "ada")])
        .build()
        .unwrap();
    endpoint.call(&exchange);

    let reply = exchange.take_reply().unwrap();
    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = serde_json::from_slice(&reply.body).unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_FAILED");
    assert_eq!(body["request_id"], "0191e3c4-6b1f-7cc0-a0f5-1a2b3c4d5e6f");
}

#[test]
fn test_envelope_request_id_matches_handler_context() {
    let seen = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&seen);
    let endpoint = Dispatcher::new().endpoint(move |ctx: RequestContext| -> anyhow::Result<()> {
        *sink.lock() = Some(ctx.request_id().to_string());
        anyhow::bail!("storage offline")
    });

    let exchange = TestRequest::get("/items").build().unwrap();
    assert_eq!(endpoint.call(&exchange), Dispatched::Responded);

    let handler_id = seen.lock().take().unwrap();
    let body: Value = serde_json::from_slice(&exchange.take_reply().unwrap().body).unwrap();
    assert_eq!(body["error"]["code"], "HANDLER_ERROR");
    assert_eq!(body["request_id"], handler_id.as_str());
}

#[test]
fn test_valid_record_reaches_handler() {
    let dispatcher = Dispatcher::builder().validator(login_schema()).build();
    let endpoint = dispatcher.endpoint(|login: Login| format!("welcome {}", login.user));

    let exchange = TestRequest::post("/login")
        .form([("user", "ada"), ("password", "correct horse")])
        .build()
        .unwrap();

    assert_eq!(endpoint.call(&exchange), Dispatched::Responded);
    assert_eq!(exchange.take_reply().unwrap().text(), Some("\"welcome ada\""));
}

#[test]
fn test_disabled_validation() {
    let config = BindingConfig {
        disable_validation: true,
        ..BindingConfig::default()
    };
    let dispatcher = Dispatcher::builder()
        .validator(login_schema())
        .configure(&config)
        .build();
    let endpoint = dispatcher.endpoint(|login: Login| login.password);

    let exchange = TestRequest::post("/login")
        .form([("user", ""), ("password", "x")])
        .build()
        .unwrap();

    assert_eq!(endpoint.call(&exchange), Dispatched::Responded);
    assert_eq!(exchange.take_reply().unwrap().text(), Some("\"x\""));
}

#[test]
fn test_aborted_request_writes_nothing() {
    let (calls, responder) = recording();
    let invoked = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&invoked);
    let dispatcher = Dispatcher::builder().responder(responder).build();
    let endpoint = dispatcher.endpoint(move |_: Lookup| {
        *counter.lock() += 1;
        "found"
    });

    let exchange = TestRequest::get("/items/1")
        .path_param("id", "1")
        .build()
        .unwrap();
    exchange.abort();

    assert_eq!(endpoint.call(&exchange), Dispatched::Aborted);
    assert_eq!(*invoked.lock(), 0);
    assert!(calls.lock().is_empty());
    assert!(!exchange.has_reply());
}

#[test]
fn test_silent_handler_keeps_its_own_reply() {
    let endpoint = Dispatcher::new().endpoint(|exchange: Exchange, lookup: Lookup| {
        exchange.reply_text(StatusCode::ACCEPTED, format!("queued {}", lookup.id));
    });

    let exchange = TestRequest::get("/items/5")
        .path_param("id", "5")
        .build()
        .unwrap();

    assert_eq!(endpoint.call(&exchange), Dispatched::Silent);
    let reply = exchange.take_reply().unwrap();
    assert_eq!(reply.status, StatusCode::ACCEPTED);
    assert_eq!(reply.text(), Some("queued 5"));
}

#[test]
fn test_handler_error_is_internal() {
    let endpoint = Dispatcher::new().endpoint(|lookup: Lookup| -> anyhow::Result<String> {
        anyhow::bail!("item {} not found", lookup.id)
    });

    let exchange = TestRequest::get("/items/3")
        .path_param("id", "3")
        .build()
        .unwrap();
    assert_eq!(endpoint.call(&exchange), Dispatched::Responded);

    let reply = exchange.take_reply().unwrap();
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = serde_json::from_slice(&reply.body).unwrap();
    assert_eq!(body["error"]["code"], "HANDLER_ERROR");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("item 3 not found"));
}

#[test]
fn test_empty_outcome_is_no_content() {
    let endpoint = Dispatcher::new().endpoint(|| Outcome::empty());

    let exchange = TestRequest::delete("/items/3").build().unwrap();
    assert_eq!(endpoint.call(&exchange), Dispatched::Responded);
    assert_eq!(exchange.take_reply().unwrap().status, StatusCode::NO_CONTENT);
}

#[test]
fn test_context_and_records_in_any_order() {
    let endpoint = Dispatcher::new().endpoint(
        |lookup: Lookup, ctx: RequestContext, exchange: Exchange| {
            Outcome::ok(json!({
                "id": lookup.id,
                "verbose": lookup.verbose,
                "method": exchange.method().as_str(),
                "has_request_id": !ctx.request_id().to_string().is_empty(),
            }))
        },
    );

    let exchange = TestRequest::get("/items/8")
        .path_param("id", "8")
        .query("verbose", "true")
        .build()
        .unwrap();
    endpoint.call(&exchange);

    let body: Value = serde_json::from_slice(&exchange.take_reply().unwrap().body).unwrap();
    assert_eq!(
        body,
        json!({"id": 8, "verbose": true, "method": "GET", "has_request_id": true})
    );
}

#[test]
fn test_routes_through_mount() {
    let dispatcher = Dispatcher::builder()
        .configure(&HeronConfig::production().binding)
        .build();

    let mut mount = RecordingMount::new();
    dispatcher
        .routes()
        .middleware(|exchange: Exchange| {
            if exchange.header("authorization").is_none() {
                exchange.reply_text(StatusCode::UNAUTHORIZED, "login first");
                exchange.abort();
            }
        })
        .get("/items/:id", |lookup: Lookup| Outcome::ok(lookup.id))
        .post("/login", |login: Login| login.user)
        .mount(&mut mount);

    assert_eq!(mount.routes().len(), 2);
    assert_eq!(mount.routes()[0].method, Some(Method::GET));

    let response = mount.send(TestRequest::get("/items/12")).unwrap();
    assert_eq!(response.dispatched(), [Dispatched::Silent]);
    response.assert_status(StatusCode::UNAUTHORIZED);

    let response = mount
        .send(TestRequest::get("/items/12").header("authorization", "token"))
        .unwrap();
    assert_eq!(
        response.dispatched(),
        [Dispatched::Silent, Dispatched::Responded]
    );
    response.assert_status(StatusCode::OK).assert_body_eq("12");

    let response = mount
        .send(TestRequest::get("/items/twelve").header("authorization", "token"))
        .unwrap();
    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_code("INVALID_PARAMETER");
}
