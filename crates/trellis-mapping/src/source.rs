//! Raw parameter extraction.
//!
//! Every [`ParameterSource`] yields strings:
//!
//! - `path`: the routed path parameters
//! - `query`: the URL-decoded query string, first occurrence wins
//! - `header`: the header value, if it is valid UTF-8
//! - `body`: a top-level field of a JSON object body; scalars are rendered as
//!   text, nested values as JSON, and `null` counts as absent

use serde_json::Map;
use std::borrow::Cow;
use trellis_core::{ApiError, ApiRequest, Endpoint, ParameterSource};

/// Raw values of one request, decoded once per dispatch.
#[derive(Debug)]
pub struct RawParameters<'a> {
    request: &'a ApiRequest,
    query: Vec<(String, String)>,
    body: Map<String, serde_json::Value>,
}

impl<'a> RawParameters<'a> {
    /// Decodes the parts of `request` that `endpoint` reads from.
    ///
    /// The query string and the body are only decoded when a declared
    /// parameter lives there.
    ///
    /// # Errors
    ///
    /// A validation error when the query string cannot be decoded or the body
    /// is not a JSON object.
    pub fn decode(request: &'a ApiRequest, endpoint: &Endpoint) -> Result<Self, ApiError> {
        let reads = |source| endpoint.parameters().iter().any(|p| p.source() == source);

        let query = match request.query_string() {
            Some(query) if reads(ParameterSource::Query) => serde_urlencoded::from_str(query)
                .map_err(|e| ApiError::validation(format!("malformed query string: {e}")))?,
            _ => Vec::new(),
        };

        let body = if reads(ParameterSource::Body) && !request.body().is_empty() {
            match serde_json::from_slice(request.body()) {
                Ok(serde_json::Value::Object(map)) => map,
                Ok(_) => return Err(ApiError::validation("request body must be a JSON object")),
                Err(e) => {
                    return Err(ApiError::validation(format!("malformed JSON body: {e}")));
                }
            }
        } else {
            Map::new()
        };

        Ok(Self {
            request,
            query,
            body,
        })
    }

    /// The raw value of `name` in `source`, if present.
    pub fn get(&self, name: &str, source: ParameterSource) -> Option<Cow<'_, str>> {
        match source {
            ParameterSource::Path => self.request.path_params().get(name).map(Cow::Borrowed),
            ParameterSource::Query => self
                .query
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| Cow::Borrowed(value.as_str())),
            ParameterSource::Header => self.request.header(name).map(Cow::Borrowed),
            ParameterSource::Body => match self.body.get(name)? {
                serde_json::Value::Null => None,
                serde_json::Value::String(s) => Some(Cow::Borrowed(s.as_str())),
                other => Some(Cow::Owned(other.to_string())),
            },
        }
    }
}
