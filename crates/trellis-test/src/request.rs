//! Test request building.

use crate::error::TestError;
use bytes::Bytes;
use http::{header, HeaderMap, HeaderName, HeaderValue, Method, Uri};
use serde::Serialize;
use trellis_core::{ApiRequest, Endpoint, PathParams};

/// A test request that can be sent through a [`TestClient`](crate::TestClient).
#[derive(Debug, Clone)]
pub struct TestRequest {
    /// HTTP method
    pub method: Method,
    /// Request URI
    pub uri: Uri,
    /// Request headers
    pub headers: HeaderMap,
    /// Request body
    pub body: Bytes,
    /// Path parameters, as a router would have extracted them
    pub path_params: PathParams,
    /// Endpoint bound ahead of dispatch, for pipelines without a router
    pub endpoint: Option<Endpoint>,
}

impl TestRequest {
    /// Creates a new GET request.
    pub fn get(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::GET, uri)
    }

    /// Creates a new POST request.
    pub fn post(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::POST, uri)
    }

    /// Creates a new PUT request.
    pub fn put(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::PUT, uri)
    }

    /// Creates a new PATCH request.
    pub fn patch(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::PATCH, uri)
    }

    /// Creates a new DELETE request.
    pub fn delete(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::DELETE, uri)
    }

    /// Converts this request into the pipeline's request value.
    pub fn into_api_request(self) -> ApiRequest {
        let mut request = ApiRequest::new(self.method, self.uri)
            .with_body(self.body)
            .with_path_params(self.path_params);
        for (name, value) in &self.headers {
            if let Ok(value) = value.to_str() {
                request = request.with_header(name.as_str(), value);
            }
        }
        match self.endpoint {
            Some(endpoint) => request.with_endpoint(endpoint),
            None => request,
        }
    }

    /// Converts this request to a native HTTP request.
    ///
    /// Path parameters and the endpoint are not carried.
    pub fn into_http_request(self) -> Result<http::Request<Bytes>, TestError> {
        let mut builder = http::Request::builder().method(self.method).uri(self.uri);
        for (name, value) in &self.headers {
            builder = builder.header(name, value);
        }
        builder
            .body(self.body)
            .map_err(|e| TestError::RequestBuild(e.to_string()))
    }
}

/// Builder for constructing test requests.
///
/// Invalid headers and failed body encodings are reported by
/// [`build`](Self::build), not when they are set.
#[must_use]
#[derive(Debug)]
pub struct TestRequestBuilder {
    method: Method,
    uri: String,
    headers: HeaderMap,
    body: Option<Bytes>,
    path_params: PathParams,
    endpoint: Option<Endpoint>,
    error: Option<TestError>,
}

impl TestRequestBuilder {
    /// Creates a new request builder.
    pub fn new(method: Method, uri: impl AsRef<str>) -> Self {
        Self {
            method,
            uri: uri.as_ref().to_string(),
            headers: HeaderMap::new(),
            body: None,
            path_params: PathParams::new(),
            endpoint: None,
            error: None,
        }
    }

    /// Sets a header on the request.
    ///
    /// # Example
    ///
    /// ```
    /// use trellis_test::TestRequest;
    ///
    /// let request = TestRequest::get("/users")
    ///     .header("X-Auth", "token")
    ///     .header("X-Request-ID", "12345")
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(request.headers["x-auth"], "token");
    /// ```
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let name = HeaderName::try_from(name.as_ref());
        let value = HeaderValue::try_from(value.as_ref());
        match (name, value) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            (Err(e), _) => self.fail(TestError::InvalidHeader(e.to_string())),
            (_, Err(e)) => self.fail(TestError::InvalidHeader(e.to_string())),
        }
        self
    }

    /// Sets the Content-Type header.
    pub fn content_type(self, content_type: impl AsRef<str>) -> Self {
        self.header(header::CONTENT_TYPE.as_str(), content_type)
    }

    /// Sets the Authorization header with a Bearer token.
    pub fn bearer_token(self, token: impl AsRef<str>) -> Self {
        self.header(
            header::AUTHORIZATION.as_str(),
            format!("Bearer {}", token.as_ref()),
        )
    }

    /// Sets the raw request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the request body as JSON.
    ///
    /// This also sets the `Content-Type` header to `application/json`.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.body = Some(Bytes::from(bytes)),
            Err(e) => self.fail(TestError::Json(e)),
        }
        self.content_type("application/json")
    }

    /// Sets the request body as form-urlencoded.
    pub fn form<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_urlencoded::to_string(value) {
            Ok(encoded) => self.body = Some(Bytes::from(encoded)),
            Err(e) => self.fail(TestError::RequestBuild(e.to_string())),
        }
        self.content_type("application/x-www-form-urlencoded")
    }

    /// Adds a path parameter, as a router would.
    pub fn path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.push(name, value);
        self
    }

    /// Binds `endpoint` before dispatch.
    pub fn endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Builds the test request.
    pub fn build(self) -> Result<TestRequest, TestError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let uri: Uri = self
            .uri
            .parse()
            .map_err(|e| TestError::RequestBuild(format!("Invalid URI: {e}")))?;

        Ok(TestRequest {
            method: self.method,
            uri,
            headers: self.headers,
            body: self.body.unwrap_or_default(),
            path_params: self.path_params,
            endpoint: self.endpoint,
        })
    }

    fn fail(&mut self, error: TestError) {
        self.error.get_or_insert(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use trellis_core::EndpointHandler;

    #[test]
    fn test_basic_get() {
        let request = TestRequest::get("/users?page=2").build().unwrap();
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.uri.query(), Some("page=2"));
        assert!(request.body.is_empty());
    }

    #[test]
    fn test_json_body() {
        let request = TestRequest::post("/users")
            .json(&json!({"name": "Alice"}))
            .build()
            .unwrap();
        assert_eq!(request.headers["content-type"], "application/json");
        assert_eq!(request.body.as_ref(), br#"{"name":"Alice"}"#);
    }

    #[test]
    fn test_form_body() {
        let request = TestRequest::post("/login")
            .form(&[("user", "ada"), ("pass", "a b")])
            .build()
            .unwrap();
        assert_eq!(request.body.as_ref(), b"user=ada&pass=a+b");
    }

    #[test]
    fn test_invalid_header_reported_at_build() {
        let err = TestRequest::get("/")
            .header("bad header", "x")
            .build()
            .unwrap_err();
        assert!(matches!(err, TestError::InvalidHeader(_)));
    }

    #[test]
    fn test_invalid_uri() {
        let err = TestRequest::get("http://[::1").build().unwrap_err();
        assert!(matches!(err, TestError::RequestBuild(_)));
    }

    #[test]
    fn test_into_api_request() {
        let request = TestRequest::put("/users/7")
            .bearer_token("t")
            .path_param("id", "7")
            .endpoint(Endpoint::new(EndpointHandler::new("users", "update")))
            .build()
            .unwrap()
            .into_api_request();

        assert_eq!(request.method(), Method::PUT);
        assert_eq!(request.header("authorization"), Some("Bearer t"));
        assert_eq!(request.path_params().get("id"), Some("7"));
        assert_eq!(request.endpoint().unwrap().handler().method(), "update");
    }
}
