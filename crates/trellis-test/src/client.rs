//! Test client for in-memory dispatch.

use crate::error::TestError;
use crate::request::{TestRequest, TestRequestBuilder};
use crate::response::TestResponse;
use bytes::Bytes;
use http::Method;
use std::sync::Arc;
use trellis_core::{ApiResponse, Endpoint};
use trellis_pipeline::Dispatcher;

/// Sends test requests through a [`Dispatcher`].
///
/// Requests go through every decorator chain exactly as in production; no
/// transport is involved.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use trellis_core::{Endpoint, EndpointHandler, FnService, Reply, ServiceRegistry};
/// use trellis_pipeline::{DecoratorRegistry, Dispatcher};
/// use trellis_test::TestClient;
///
/// let mut services = ServiceRegistry::new();
/// services.register_named(
///     "ping",
///     Arc::new(FnService::new().method("ping", |_, _| Ok(Reply::Data(serde_json::json!({"pong": true}))))),
/// );
/// let client = TestClient::new(Dispatcher::new(DecoratorRegistry::new().distribute(), services));
///
/// client
///     .get("/ping")
///     .endpoint(Endpoint::new(EndpointHandler::new("ping", "ping")))
///     .send()
///     .assert_success()
///     .assert_entity_field("pong", &serde_json::json!(true));
/// ```
#[must_use]
#[derive(Debug, Clone)]
pub struct TestClient {
    dispatcher: Arc<Dispatcher>,
    default_headers: Vec<(String, String)>,
}

impl TestClient {
    /// Creates a client over `dispatcher`.
    pub fn new(dispatcher: impl Into<Arc<Dispatcher>>) -> Self {
        Self {
            dispatcher: dispatcher.into(),
            default_headers: Vec::new(),
        }
    }

    /// Adds a default header that will be included in all requests.
    pub fn with_default_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// The dispatcher requests are sent through.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Creates a GET request builder.
    pub fn get(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::get(uri))
    }

    /// Creates a POST request builder.
    pub fn post(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::post(uri))
    }

    /// Creates a PUT request builder.
    pub fn put(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::put(uri))
    }

    /// Creates a PATCH request builder.
    pub fn patch(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::patch(uri))
    }

    /// Creates a DELETE request builder.
    pub fn delete(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::delete(uri))
    }

    /// Creates a request builder with a custom method.
    pub fn request(&self, method: Method, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequestBuilder::new(method, uri))
    }

    fn send_internal(&self, request: TestRequest) -> Result<TestResponse, TestError> {
        let response = self
            .dispatcher
            .dispatch_api(request.into_api_request(), ApiResponse::new())?;
        Ok(TestResponse::from_api(response))
    }
}

/// A request builder bound to a test client.
#[derive(Debug)]
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    builder: TestRequestBuilder,
}

impl<'a> TestClientRequest<'a> {
    fn new(client: &'a TestClient, builder: TestRequestBuilder) -> Self {
        let builder = client
            .default_headers
            .iter()
            .fold(builder, |builder, (name, value)| builder.header(name, value));
        Self { client, builder }
    }

    /// Sets a header on the request.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Sets the Authorization header with a Bearer token.
    pub fn bearer_token(mut self, token: impl AsRef<str>) -> Self {
        self.builder = self.builder.bearer_token(token);
        self
    }

    /// Sets the raw request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.builder = self.builder.body(body);
        self
    }

    /// Sets the request body as JSON.
    pub fn json<T: serde::Serialize + ?Sized>(mut self, value: &T) -> Self {
        self.builder = self.builder.json(value);
        self
    }

    /// Adds a path parameter, as a router would.
    pub fn path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.builder = self.builder.path_param(name, value);
        self
    }

    /// Binds `endpoint` before dispatch.
    pub fn endpoint(mut self, endpoint: Endpoint) -> Self {
        self.builder = self.builder.endpoint(endpoint);
        self
    }

    /// Sends the request and returns the response.
    ///
    /// # Panics
    ///
    /// Panics if the request is invalid or dispatch fails.
    #[track_caller]
    pub fn send(self) -> TestResponse {
        match self.try_send() {
            Ok(response) => response,
            Err(e) => panic!("request should succeed: {e}"),
        }
    }

    /// Sends the request and returns a Result.
    pub fn try_send(self) -> Result<TestResponse, TestError> {
        let request = self.builder.build()?;
        self.client.send_internal(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use serde_json::json;
    use trellis_core::{ApiError, DispatchError, EndpointHandler, FnService, Reply, ServiceRegistry};
    use trellis_pipeline::DecoratorRegistry;

    fn echo() -> TestClient {
        let echo = FnService::new()
            .method("echo", |req, _| {
                Ok(Reply::Data(json!({
                    "method": req.method().as_str(),
                    "path": req.path(),
                    "custom": req.header("x-custom"),
                    "id": req.path_params().get("id"),
                })))
            })
            .method("fail", |_, _| Err(ApiError::conflict("taken")));
        let mut services = ServiceRegistry::new();
        services.register_named("echo", Arc::new(echo));
        TestClient::new(Dispatcher::new(DecoratorRegistry::new().distribute(), services))
    }

    fn bound(method: &str) -> Endpoint {
        Endpoint::new(EndpointHandler::new("echo", method.to_string()))
    }

    #[test]
    fn test_echo() {
        let response = echo()
            .get("/test/path")
            .path_param("id", "9")
            .endpoint(bound("echo"))
            .send();

        response
            .assert_status(StatusCode::OK)
            .assert_entity_field("method", &json!("GET"))
            .assert_entity_field("path", &json!("/test/path"))
            .assert_entity_field("id", &json!("9"));
    }

    #[test]
    fn test_default_headers() {
        let client = echo().with_default_header("X-Custom", "default-value");
        client
            .post("/")
            .endpoint(bound("echo"))
            .send()
            .assert_entity_field("custom", &json!("default-value"));
    }

    #[test]
    fn test_custom_method() {
        echo()
            .request(Method::OPTIONS, "/")
            .endpoint(bound("echo"))
            .send()
            .assert_entity_field("method", &json!("OPTIONS"));
    }

    #[test]
    fn test_dispatch_error_surfaces() {
        let err = echo()
            .get("/")
            .endpoint(bound("fail"))
            .try_send()
            .unwrap_err();
        assert!(matches!(err, TestError::Dispatch(DispatchError::Api(ApiError::Conflict { .. }))));
    }

    #[test]
    fn test_missing_endpoint() {
        let err = echo().get("/").try_send().unwrap_err();
        assert!(matches!(err, TestError::Dispatch(DispatchError::MissingEndpoint)));
    }
}
