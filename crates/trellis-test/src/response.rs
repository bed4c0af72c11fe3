//! Test response wrapper.

use crate::error::TestError;
use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, StatusCode};
use serde::de::DeserializeOwned;
use std::fmt;
use trellis_core::{ApiResponse, Entity};

/// A dispatched response with helpers for assertions.
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    entity: Option<Entity>,
}

impl TestResponse {
    /// Wraps a pipeline response, keeping its entity.
    pub fn from_api(response: ApiResponse) -> Self {
        let entity = response.entity().cloned();
        let (parts, body) = response.into_http().into_parts();
        Self {
            status: parts.status,
            headers: parts.headers,
            body,
            entity,
        }
    }

    /// Wraps a native HTTP response.
    pub fn from_http(response: http::Response<Bytes>) -> Self {
        let (parts, body) = response.into_parts();
        Self::new(parts.status, parts.headers, body)
    }

    /// Creates a test response from raw parts.
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
            entity: None,
        }
    }

    /// Returns the status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the status code as a u16.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Returns true for 2xx.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns true for 4xx.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status.is_client_error()
    }

    /// Returns true for 5xx.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status.is_server_error()
    }

    /// Returns the response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value.
    #[must_use]
    pub fn header(&self, name: impl AsRef<str>) -> Option<&HeaderValue> {
        self.headers.get(name.as_ref())
    }

    /// Returns a header value as a string.
    #[must_use]
    pub fn header_str(&self, name: impl AsRef<str>) -> Option<&str> {
        self.header(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the Content-Type header.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header_str(header::CONTENT_TYPE.as_str())
    }

    /// Returns the raw body bytes.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// The endpoint's structured result, if the response came from
    /// [`from_api`](Self::from_api) and the endpoint returned data.
    #[must_use]
    pub fn entity(&self) -> Option<&serde_json::Value> {
        self.entity.as_ref().map(Entity::value)
    }

    /// Returns the body as a string.
    pub fn text(&self) -> Result<String, TestError> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| TestError::BodyRead(format!("Invalid UTF-8: {e}")))
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        serde_json::from_slice(&self.body).map_err(TestError::Json)
    }

    /// Deserializes the body as a JSON Value.
    pub fn json_value(&self) -> Result<serde_json::Value, TestError> {
        self.json()
    }

    // Assertion methods

    /// Asserts that the status code equals the expected value.
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match.
    #[track_caller]
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status, expected,
            "Expected status {}, got {}",
            expected, self.status
        );
        self
    }

    /// Asserts that the response is successful (2xx).
    ///
    /// # Panics
    ///
    /// Panics if the status is not 2xx.
    #[track_caller]
    pub fn assert_success(&self) -> &Self {
        assert!(
            self.is_success(),
            "Expected success status, got {}",
            self.status
        );
        self
    }

    /// Asserts that a header exists with the expected value.
    ///
    /// # Panics
    ///
    /// Panics if the header doesn't exist or doesn't match.
    #[track_caller]
    pub fn assert_header(&self, name: impl AsRef<str>, expected: impl AsRef<str>) -> &Self {
        let name = name.as_ref();
        let expected = expected.as_ref();
        let actual = self
            .header_str(name)
            .unwrap_or_else(|| panic!("Header '{name}' not found"));
        assert_eq!(
            actual, expected,
            "Header '{name}': expected '{expected}', got '{actual}'"
        );
        self
    }

    /// Asserts that a header is absent.
    ///
    /// # Panics
    ///
    /// Panics if the header exists.
    #[track_caller]
    pub fn assert_no_header(&self, name: impl AsRef<str>) -> &Self {
        let name = name.as_ref();
        assert!(
            self.header(name).is_none(),
            "Header '{name}' should be absent"
        );
        self
    }

    /// Asserts that the body contains the expected substring.
    ///
    /// # Panics
    ///
    /// Panics if the body doesn't contain the substring.
    #[track_caller]
    pub fn assert_body_contains(&self, expected: impl AsRef<str>) -> &Self {
        let expected = expected.as_ref();
        let body = self.text().expect("Body should be valid UTF-8");
        assert!(
            body.contains(expected),
            "Body should contain '{expected}', got: {body}"
        );
        self
    }

    /// Asserts that a JSON body field exists and equals the expected value.
    ///
    /// Paths are dot separated; numeric segments index arrays.
    ///
    /// # Panics
    ///
    /// Panics if the field doesn't exist or doesn't match.
    #[track_caller]
    pub fn assert_json_field(&self, path: impl AsRef<str>, expected: &serde_json::Value) -> &Self {
        let path = path.as_ref();
        let json: serde_json::Value = self.json().expect("Body should be valid JSON");
        let actual = json_path(&json, path)
            .unwrap_or_else(|| panic!("JSON path '{path}' not found in: {json}"));
        assert_eq!(
            actual, expected,
            "JSON field '{path}': expected {expected}, got {actual}"
        );
        self
    }

    /// Asserts that an entity field exists and equals the expected value.
    ///
    /// # Panics
    ///
    /// Panics if there is no entity, or the field doesn't exist or match.
    #[track_caller]
    pub fn assert_entity_field(
        &self,
        path: impl AsRef<str>,
        expected: &serde_json::Value,
    ) -> &Self {
        let path = path.as_ref();
        let entity = self.entity().expect("Response should carry an entity");
        let actual = json_path(entity, path)
            .unwrap_or_else(|| panic!("Entity path '{path}' not found in: {entity}"));
        assert_eq!(
            actual, expected,
            "Entity field '{path}': expected {expected}, got {actual}"
        );
        self
    }
}

impl fmt::Debug for TestResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body_len", &self.body.len())
            .field("entity", &self.entity.is_some())
            .finish()
    }
}

fn json_path<'a>(value: &'a serde_json::Value, path: &str) -> Option<&'a serde_json::Value> {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(value, |current, segment| match segment.parse::<usize>() {
            Ok(index) => current.get(index),
            Err(_) => current.get(segment),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_response(status: u16, body: &str) -> TestResponse {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        TestResponse::new(
            StatusCode::from_u16(status).unwrap(),
            headers,
            Bytes::from(body.to_string()),
        )
    }

    #[test]
    fn test_status_classes() {
        assert!(create_response(204, "").is_success());
        assert!(create_response(404, "").is_client_error());
        assert!(create_response(503, "").is_server_error());
    }

    #[test]
    fn test_json_assertions() {
        let response = create_response(200, r#"{"user":{"id":7,"tags":["a","b"]}}"#);
        response
            .assert_status(StatusCode::OK)
            .assert_header("content-type", "application/json")
            .assert_json_field("user.id", &json!(7))
            .assert_json_field("user.tags.1", &json!("b"))
            .assert_no_header("x-trace");
    }

    #[test]
    #[should_panic(expected = "Expected status")]
    fn test_assert_status_fails() {
        create_response(500, "").assert_status(StatusCode::OK);
    }

    #[test]
    fn test_from_api_keeps_entity() {
        let api = ApiResponse::new()
            .with_header("x-trace", "t")
            .with_entity(Entity::new(json!({"id": 1})));
        let response = TestResponse::from_api(api);
        response
            .assert_header("x-trace", "t")
            .assert_entity_field("id", &json!(1));
        assert!(response.body().is_empty());
    }

    #[test]
    fn test_text_invalid_utf8() {
        let response = TestResponse::new(StatusCode::OK, HeaderMap::new(), Bytes::from_static(&[0xff]));
        assert!(matches!(response.text(), Err(TestError::BodyRead(_))));
    }
}
