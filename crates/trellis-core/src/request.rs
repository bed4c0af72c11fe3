//! The immutable request value.

use crate::{Endpoint, PathParams, Value};
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method, Uri, Version};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A request flowing through the decoration pipeline.
///
/// `ApiRequest` wraps the parts of an `http::Request<Bytes>` and adds an
/// attribute map, routing path parameters and the bound [`Endpoint`]. All
/// `with_*` methods consume `self` and return the transformed value, so a
/// decorator always hands a fresh request to the next stage.
///
/// # Example
///
/// ```
/// use trellis_core::{ApiRequest, Value};
///
/// let request = ApiRequest::get("/users/7?verbose=1")
///     .with_header("x-auth", "secret")
///     .with_attribute("id", 7);
///
/// assert_eq!(request.header("X-Auth"), Some("secret"));
/// assert_eq!(request.attribute("id"), Some(&Value::Int(7)));
/// assert_eq!(request.query_string(), Some("verbose=1"));
/// ```
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    uri: Uri,
    version: Version,
    headers: HeaderMap,
    body: Bytes,
    path_params: PathParams,
    attributes: BTreeMap<String, Value>,
    endpoint: Option<Arc<Endpoint>>,
}

impl ApiRequest {
    /// Creates a request with an empty body.
    #[must_use]
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            version: Version::HTTP_11,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            path_params: PathParams::new(),
            attributes: BTreeMap::new(),
            endpoint: None,
        }
    }

    /// Creates a GET request for `uri`.
    ///
    /// An unparsable `uri` falls back to `/`.
    #[must_use]
    pub fn get(uri: &str) -> Self {
        Self::new(Method::GET, uri.parse().unwrap_or_default())
    }

    /// Wraps a native HTTP request.
    #[must_use]
    pub fn from_http(request: http::Request<Bytes>) -> Self {
        let (parts, body) = request.into_parts();
        Self {
            method: parts.method,
            uri: parts.uri,
            version: parts.version,
            headers: parts.headers,
            body,
            path_params: PathParams::new(),
            attributes: BTreeMap::new(),
            endpoint: None,
        }
    }

    /// Unwraps into a native HTTP request, dropping attributes and endpoint.
    #[must_use]
    pub fn into_http(self) -> http::Request<Bytes> {
        let mut request = http::Request::new(self.body);
        *request.method_mut() = self.method;
        *request.uri_mut() = self.uri;
        *request.version_mut() = self.version;
        *request.headers_mut() = self.headers;
        request
    }

    /// The HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// The request URI.
    #[must_use]
    pub const fn uri(&self) -> &Uri {
        &self.uri
    }

    /// The request path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// The raw query string, without the leading `?`.
    #[must_use]
    pub fn query_string(&self) -> Option<&str> {
        self.uri.query()
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

    /// Returns a header value as a string. Non-UTF-8 values are treated as absent.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The raw body.
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Path parameters bound by routing.
    #[must_use]
    pub const fn path_params(&self) -> &PathParams {
        &self.path_params
    }

    /// All attributes, ordered by key.
    #[must_use]
    pub const fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    /// Returns one attribute.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// The bound endpoint, if routing has happened.
    #[must_use]
    pub fn endpoint(&self) -> Option<&Arc<Endpoint>> {
        self.endpoint.as_ref()
    }

    /// Returns a request with a different method.
    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Returns a request with a header set, replacing existing values.
    ///
    /// Invalid header names or values are ignored.
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

    /// Returns a request with a new body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Returns a request with an attribute set.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Returns a request without the attribute `key`.
    #[must_use]
    pub fn without_attribute(mut self, key: &str) -> Self {
        self.attributes.remove(key);
        self
    }

    /// Returns a request bound to `endpoint`.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<Arc<Endpoint>>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Returns a request carrying the given path parameters.
    #[must_use]
    pub fn with_path_params(mut self, params: PathParams) -> Self {
        self.path_params = params;
        self
    }
}

impl From<http::Request<Bytes>> for ApiRequest {
    fn from(request: http::Request<Bytes>) -> Self {
        Self::from_http(request)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn with_attribute_leaves_original_untouched(key in "[a-z]{1,8}", value in any::<i64>()) {
            let original = ApiRequest::get("/items");
            let updated = original.clone().with_attribute(key.clone(), value);

            prop_assert!(original.attribute(&key).is_none());
            prop_assert_eq!(updated.attribute(&key), Some(&Value::Int(value)));
        }

        #[test]
        fn latest_attribute_wins(key in "[a-z]{1,8}", first in any::<i64>(), second in ".*") {
            let request = ApiRequest::get("/items")
                .with_attribute(key.clone(), first)
                .with_attribute(key.clone(), second.clone());
            prop_assert_eq!(request.attribute(&key), Some(&Value::String(second)));
        }
    }
}
