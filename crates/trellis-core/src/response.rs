//! The immutable response value.

use crate::{ApiError, Endpoint};
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, StatusCode, Version};
use serde::Serialize;
use std::sync::Arc;

/// A structured endpoint result awaiting serialization.
///
/// Endpoints that return data rather than a finished response get their
/// result attached to the response as an `Entity`. Turning it into bytes is
/// left to a response decorator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Entity(serde_json::Value);

impl Entity {
    /// Wraps a JSON value.
    #[must_use]
    pub const fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// The wrapped value.
    #[must_use]
    pub const fn value(&self) -> &serde_json::Value {
        &self.0
    }

    /// Consumes the entity, returning the wrapped value.
    #[must_use]
    pub fn into_inner(self) -> serde_json::Value {
        self.0
    }
}

/// A response flowing through the decoration pipeline.
///
/// # Example
///
/// ```
/// use http::StatusCode;
/// use trellis_core::ApiResponse;
///
/// let response = ApiResponse::new()
///     .with_status(StatusCode::CREATED)
///     .with_header("x-trace", "abc");
///
/// assert_eq!(response.status(), StatusCode::CREATED);
/// assert_eq!(response.header("x-trace"), Some("abc"));
/// assert!(response.entity().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    version: Version,
    headers: HeaderMap,
    body: Bytes,
    entity: Option<Entity>,
    endpoint: Option<Arc<Endpoint>>,
}

impl Default for ApiResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiResponse {
    /// Creates an empty `200 OK` response.
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            version: Version::HTTP_11,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            entity: None,
            endpoint: None,
        }
    }

    /// Wraps a native HTTP response.
    #[must_use]
    pub fn from_http(response: http::Response<Bytes>) -> Self {
        let (parts, body) = response.into_parts();
        Self {
            status: parts.status,
            version: parts.version,
            headers: parts.headers,
            body,
            entity: None,
            endpoint: None,
        }
    }

    /// Builds a JSON error envelope response for `error`.
    #[must_use]
    pub fn from_error(error: &ApiError) -> Self {
        Self::new()
            .with_status(error.status_code())
            .with_json(&error.to_envelope())
    }

    /// Unwraps into a native HTTP response. The entity and endpoint are dropped.
    #[must_use]
    pub fn into_http(self) -> http::Response<Bytes> {
        let mut response = http::Response::new(self.body);
        *response.status_mut() = self.status;
        *response.version_mut() = self.version;
        *response.headers_mut() = self.headers;
        response
    }

    /// The status code.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// The HTTP version.
    #[must_use]
    pub const fn version(&self) -> Version {
        self.version
    }

    /// All headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value as a string.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The raw body.
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// The structured result, if the endpoint produced one.
    #[must_use]
    pub const fn entity(&self) -> Option<&Entity> {
        self.entity.as_ref()
    }

    /// The endpoint that produced this response.
    #[must_use]
    pub fn endpoint(&self) -> Option<&Arc<Endpoint>> {
        self.endpoint.as_ref()
    }

    /// Returns a response with a new status.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Returns a response with a header set. Invalid names or values are ignored.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Returns a response with a new body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Returns a response with a JSON body and content type.
    ///
    /// Values that fail to serialize produce an empty body.
    #[must_use]
    pub fn with_json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        self.body = serde_json::to_vec(value).map(Bytes::from).unwrap_or_default();
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self
    }

    /// Returns a response carrying `entity`.
    #[must_use]
    pub fn with_entity(mut self, entity: Entity) -> Self {
        self.entity = Some(entity);
        self
    }

    /// Returns a response bound to `endpoint`.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: Arc<Endpoint>) -> Self {
        self.endpoint = Some(endpoint);
        self
    }
}

impl From<http::Response<Bytes>> for ApiResponse {
    fn from(response: http::Response<Bytes>) -> Self {
        Self::from_http(response)
    }
}
