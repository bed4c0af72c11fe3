//! End-to-end dispatch tests.
//!
//! These tests drive a [`Dispatcher`] through every stage:
//!
//! 1. Request chain (with and without short-circuit)
//! 2. Routing
//! 3. Handler request chain
//! 4. Endpoint invocation and reply classification
//! 5. Handler and pipeline exception chains
//! 6. Handler response and response chains

use bytes::Bytes;
use http::StatusCode;
use serde_json::json;
use std::sync::{Arc, Mutex};
use trellis_core::{
    ApiError, ApiRequest, ApiResponse, DispatchError, Endpoint, EndpointHandler, FnService, Reply,
    ServiceRegistry,
};
use trellis_pipeline::decorators::ErrorEnvelopeDecorator;
use trellis_pipeline::{
    Capabilities, Decorator, DecoratorRegistry, DecoratorResult, Dispatcher, ExceptionDecorator,
    HandlerExceptionDecorator, HandlerRequestDecorator, HandlerResponseDecorator,
    RequestDecorator, RequestFlow, ResponseDecorator,
};

/// Shared record of which stages ran, in order.
#[derive(Clone, Default)]
struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Rejects requests without `X-Auth`.
struct Auth(Journal);

impl Decorator for Auth {
    fn name(&self) -> &str {
        "auth"
    }

    fn capabilities(self: Arc<Self>) -> Capabilities {
        Capabilities::new().request(self)
    }
}

impl RequestDecorator for Auth {
    fn decorate_request(&self, req: &ApiRequest, _: &ApiResponse) -> DecoratorResult<RequestFlow> {
        self.0.push("request:auth");
        if req.header("x-auth").is_some() {
            Ok(RequestFlow::Continue(req.clone()))
        } else {
            Ok(RequestFlow::ShortCircuit(
                ApiResponse::new()
                    .with_status(StatusCode::UNAUTHORIZED)
                    .with_header("www-authenticate", "X-Auth")
                    .with_body("denied"),
            ))
        }
    }
}

/// Adds `X-Trace`.
struct Trace(Journal);

impl Decorator for Trace {
    fn name(&self) -> &str {
        "trace"
    }

    fn capabilities(self: Arc<Self>) -> Capabilities {
        Capabilities::new().request(self)
    }
}

impl RequestDecorator for Trace {
    fn decorate_request(&self, req: &ApiRequest, _: &ApiResponse) -> DecoratorResult<RequestFlow> {
        self.0.push("request:trace");
        Ok(RequestFlow::Continue(req.clone().with_header("x-trace", "t-1")))
    }
}

/// Records every non-exception stage and passes values through.
struct Tracker(Journal);

impl Decorator for Tracker {
    fn name(&self) -> &str {
        "tracker"
    }

    fn capabilities(self: Arc<Self>) -> Capabilities {
        Capabilities::new()
            .handler_request(self.clone())
            .handler_response(self.clone())
            .response(self)
    }
}

impl HandlerRequestDecorator for Tracker {
    fn decorate_handler_request(
        &self,
        req: &ApiRequest,
        _: &ApiResponse,
    ) -> DecoratorResult<RequestFlow> {
        self.0.push("handler_request:tracker");
        Ok(RequestFlow::Continue(req.clone()))
    }
}

impl HandlerResponseDecorator for Tracker {
    fn decorate_handler_response(
        &self,
        _: &ApiRequest,
        res: &ApiResponse,
    ) -> DecoratorResult<ApiResponse> {
        self.0.push("handler_response:tracker");
        Ok(res.clone())
    }
}

impl ResponseDecorator for Tracker {
    fn decorate_response(&self, req: &ApiRequest, res: &ApiResponse) -> DecoratorResult<ApiResponse> {
        let routed = if req.endpoint().is_some() { "routed" } else { "unrouted" };
        self.0.push(format!("response:tracker:{routed}"));
        Ok(res.clone())
    }
}

/// A handler request decorator that illegally short-circuits.
struct Rogue;

impl Decorator for Rogue {
    fn name(&self) -> &str {
        "rogue"
    }

    fn capabilities(self: Arc<Self>) -> Capabilities {
        Capabilities::new().handler_request(self)
    }
}

impl HandlerRequestDecorator for Rogue {
    fn decorate_handler_request(
        &self,
        _: &ApiRequest,
        _: &ApiResponse,
    ) -> DecoratorResult<RequestFlow> {
        Ok(RequestFlow::ShortCircuit(ApiResponse::new()))
    }
}

/// Exception decorator answering with a fixed status.
struct Answer {
    name: &'static str,
    status: StatusCode,
    journal: Journal,
}

impl Decorator for Answer {
    fn name(&self) -> &str {
        self.name
    }

    fn capabilities(self: Arc<Self>) -> Capabilities {
        Capabilities::new().exception(self)
    }
}

impl ExceptionDecorator for Answer {
    fn decorate_exception(
        &self,
        _: &ApiError,
        _: &ApiRequest,
        res: &ApiResponse,
    ) -> DecoratorResult<ApiResponse> {
        self.journal.push(format!("exception:{}", self.name));
        Ok(res.clone().with_status(self.status))
    }
}

/// Handler-level exception decorator that only recovers conflicts.
struct ConflictOnly(Journal);

impl Decorator for ConflictOnly {
    fn capabilities(self: Arc<Self>) -> Capabilities {
        Capabilities::new().handler_exception(self)
    }
}

impl HandlerExceptionDecorator for ConflictOnly {
    fn decorate_handler_exception(
        &self,
        error: &ApiError,
        _: &ApiRequest,
        res: &ApiResponse,
    ) -> DecoratorResult<ApiResponse> {
        self.0.push("handler_exception:conflict_only");
        match error {
            ApiError::Conflict { .. } => Ok(res.clone().with_status(StatusCode::CONFLICT)),
            other => Err(ApiError::internal(format!("cannot recover: {other}")).into()),
        }
    }
}

fn services(journal: &Journal) -> ServiceRegistry {
    let seen = journal.clone();
    let users = FnService::new()
        .method("show", move |req, _| {
            seen.push("endpoint");
            Ok(Reply::Data(json!({
                "trace": req.header("x-trace"),
                "path": req.path(),
            })))
        })
        .method("missing", |_, _| Err(ApiError::not_found_resource("User", "7")))
        .method("busy", |_, _| Err(ApiError::conflict("locked")))
        .method("scalar", |_, _| Ok(Reply::Data(json!(42))));

    let mut registry = ServiceRegistry::new();
    registry.register_named("users", Arc::new(users));
    registry
}

/// Routes `/users/<method>` to the `users` service.
fn router(req: &ApiRequest) -> Result<ApiRequest, ApiError> {
    let method = req
        .path()
        .strip_prefix("/users/")
        .ok_or_else(|| ApiError::not_found(format!("no route for {}", req.path())))?;
    Ok(req.clone().with_endpoint(Endpoint::new(EndpointHandler::new(
        "users",
        method.to_string(),
    ))))
}

fn dispatcher(registry: &DecoratorRegistry, journal: &Journal) -> Dispatcher {
    Dispatcher::new(registry.distribute(), services(journal)).with_router(router)
}

fn get(path: &str) -> ApiRequest {
    ApiRequest::get(path)
}

#[test]
fn test_auth_without_header_short_circuits_before_trace() {
    let journal = Journal::default();
    let mut registry = DecoratorRegistry::new();
    registry.register(Arc::new(Trace(journal.clone())), 50);
    registry.register(Arc::new(Auth(journal.clone())), 100);

    let response = dispatcher(&registry, &journal)
        .dispatch_api(get("/users/show"), ApiResponse::new())
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(journal.entries(), vec!["request:auth"]);
}

#[test]
fn test_auth_with_header_runs_auth_then_trace() {
    let journal = Journal::default();
    let mut registry = DecoratorRegistry::new();
    registry.register(Arc::new(Trace(journal.clone())), 50);
    registry.register(Arc::new(Auth(journal.clone())), 100);

    let response = dispatcher(&registry, &journal)
        .dispatch_api(
            get("/users/show").with_header("x-auth", "secret"),
            ApiResponse::new(),
        )
        .unwrap();

    assert_eq!(
        journal.entries(),
        vec!["request:auth", "request:trace", "endpoint"]
    );
    let entity = response.entity().unwrap().value();
    assert_eq!(entity["trace"], "t-1");
    assert_eq!(response.endpoint().unwrap().handler().method(), "show");
}

#[test]
fn test_short_circuit_skips_handler_level_and_endpoint() {
    let journal = Journal::default();
    let mut registry = DecoratorRegistry::new();
    registry.register(Arc::new(Auth(journal.clone())), 100);
    registry.register(Arc::new(Tracker(journal.clone())), 10);

    let response = dispatcher(&registry, &journal)
        .dispatch_api(get("/users/show"), ApiResponse::new())
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    // the response chain still runs, on the unrouted request
    assert_eq!(
        journal.entries(),
        vec!["request:auth", "response:tracker:unrouted"]
    );
}

#[test]
fn test_short_circuit_with_empty_response_chain_is_returned_verbatim() {
    let journal = Journal::default();
    let mut registry = DecoratorRegistry::new();
    registry.register(Arc::new(Auth(journal.clone())), 100);

    let response = dispatcher(&registry, &journal)
        .dispatch(
            http::Request::builder()
                .uri("/users/show")
                .body(Bytes::new())
                .unwrap(),
            http::Response::new(Bytes::new()),
        )
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()["www-authenticate"], "X-Auth");
    assert_eq!(response.body().as_ref(), b"denied");
    assert_eq!(response.headers().len(), 1);
}

#[test]
fn test_full_pass_visits_stages_in_order() {
    let journal = Journal::default();
    let mut registry = DecoratorRegistry::new();
    registry.register(Arc::new(Tracker(journal.clone())), 0);
    registry.register(Arc::new(Auth(journal.clone())), 100);

    dispatcher(&registry, &journal)
        .dispatch_api(
            get("/users/show").with_header("x-auth", "1"),
            ApiResponse::new(),
        )
        .unwrap();

    assert_eq!(
        journal.entries(),
        vec![
            "request:auth",
            "handler_request:tracker",
            "endpoint",
            "handler_response:tracker",
            "response:tracker:routed",
        ]
    );
}

#[test]
fn test_handler_request_short_circuit_is_contract_violation() {
    let journal = Journal::default();
    let mut registry = DecoratorRegistry::new();
    registry.register(Arc::new(Rogue), 10);
    registry.register(Arc::new(ErrorEnvelopeDecorator::new()), 0);

    let err = dispatcher(&registry, &journal)
        .dispatch_api(get("/users/show"), ApiResponse::new())
        .unwrap_err();

    match err {
        DispatchError::ContractViolation {
            decorator, stage, ..
        } => {
            assert_eq!(decorator, "rogue");
            assert_eq!(stage, "handler_request");
        }
        other => panic!("expected contract violation, got {other}"),
    }
    assert!(journal.entries().is_empty(), "endpoint must not run");
}

#[test]
fn test_endpoint_error_with_empty_exception_chains_propagates_unchanged() {
    let journal = Journal::default();
    let registry = DecoratorRegistry::new();

    let err = dispatcher(&registry, &journal)
        .dispatch_api(get("/users/missing"), ApiResponse::new())
        .unwrap_err();

    match err {
        DispatchError::Api(error @ ApiError::NotFound { .. }) => {
            assert_eq!(error.to_string(), "Not found: User '7' not found");
        }
        other => panic!("expected the endpoint's error, got {other}"),
    }
}

#[test]
fn test_last_exception_decorator_determines_response() {
    let journal = Journal::default();
    let mut registry = DecoratorRegistry::new();
    registry.register(
        Arc::new(Answer {
            name: "first",
            status: StatusCode::BAD_GATEWAY,
            journal: journal.clone(),
        }),
        20,
    );
    registry.register(
        Arc::new(Answer {
            name: "last",
            status: StatusCode::IM_A_TEAPOT,
            journal: journal.clone(),
        }),
        10,
    );

    let response = dispatcher(&registry, &journal)
        .dispatch_api(get("/users/missing"), ApiResponse::new())
        .unwrap();

    assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    assert_eq!(journal.entries(), vec!["exception:first", "exception:last"]);
}

#[test]
fn test_handler_level_recovery_skips_pipeline_exception_chain() {
    let journal = Journal::default();
    let mut registry = DecoratorRegistry::new();
    registry.register(Arc::new(ConflictOnly(journal.clone())), 0);
    registry.register(
        Arc::new(Answer {
            name: "pipeline",
            status: StatusCode::SERVICE_UNAVAILABLE,
            journal: journal.clone(),
        }),
        0,
    );

    let response = dispatcher(&registry, &journal)
        .dispatch_api(get("/users/busy"), ApiResponse::new())
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(journal.entries(), vec!["handler_exception:conflict_only"]);
}

#[test]
fn test_declining_handler_exception_decorator_hands_its_error_to_pipeline() {
    let journal = Journal::default();
    let mut registry = DecoratorRegistry::new();
    registry.register(Arc::new(ConflictOnly(journal.clone())), 0);
    registry.register(Arc::new(ErrorEnvelopeDecorator::new().expose_internal_errors(true)), 0);

    let response = dispatcher(&registry, &journal)
        .dispatch_api(get("/users/missing"), ApiResponse::new())
        .unwrap();

    // ErrorEnvelopeDecorator is also a handler exception decorator and runs
    // after ConflictOnly at equal priority, so it never sees the declined
    // error: ConflictOnly's error aborts the handler chain first.
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("cannot recover"));
}

#[test]
fn test_routing_failure_is_recoverable() {
    let journal = Journal::default();
    let mut registry = DecoratorRegistry::new();
    registry.register(Arc::new(ErrorEnvelopeDecorator::new()), 0);

    let response = dispatcher(&registry, &journal)
        .dispatch_api(get("/orders/1"), ApiResponse::new())
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[test]
fn test_unsupported_return_type_is_never_recovered() {
    let journal = Journal::default();
    let mut registry = DecoratorRegistry::new();
    registry.register(Arc::new(ErrorEnvelopeDecorator::new()), 0);

    let err = dispatcher(&registry, &journal)
        .dispatch_api(get("/users/scalar"), ApiResponse::new())
        .unwrap_err();

    assert!(matches!(
        err,
        DispatchError::UnsupportedReturnType { found: "number" }
    ));
    assert!(!err.is_recoverable());
}

#[test]
fn test_dispatcher_is_shareable_across_threads() {
    let journal = Journal::default();
    let mut registry = DecoratorRegistry::new();
    registry.register(Arc::new(Trace(journal.clone())), 0);
    let dispatcher = Arc::new(dispatcher(&registry, &journal));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let dispatcher = Arc::clone(&dispatcher);
            std::thread::spawn(move || {
                dispatcher
                    .dispatch_api(get("/users/show"), ApiResponse::new())
                    .map(|r| r.status())
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap().unwrap(), StatusCode::OK);
    }
    assert_eq!(
        journal
            .entries()
            .iter()
            .filter(|e| e.as_str() == "endpoint")
            .count(),
        4
    );
}
