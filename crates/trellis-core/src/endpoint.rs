//! Endpoint metadata.
//!
//! An [`Endpoint`] is produced by the routing layer and bound to the request.
//! The pipeline only reads it: the [`EndpointHandler`] names the service and
//! method to invoke, and the [`EndpointParameter`]s tell parameter mapping
//! where each raw value lives and which type mapper converts it.
//!
//! # Example
//!
//! ```
//! use trellis_core::endpoint::{Endpoint, EndpointHandler, EndpointParameter, ParameterSource};
//!
//! let endpoint = Endpoint::new(EndpointHandler::new("users", "show"))
//!     .with_mask("/users/{id}")
//!     .with_parameter(EndpointParameter::new("id", "int"))
//!     .with_parameter(EndpointParameter::new("verbose", "bool").in_query().optional());
//!
//! assert_eq!(endpoint.handler().method(), "show");
//! assert_eq!(endpoint.parameters().len(), 2);
//! assert_eq!(endpoint.parameter("verbose").unwrap().source(), ParameterSource::Query);
//! ```

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Identity of a registered endpoint service.
///
/// Services are usually identified by their Rust type name (see
/// [`ServiceId::of`]), which mirrors resolving a handler "by type". An explicit
/// name can be used instead when the same type is registered more than once.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServiceId(Cow<'static, str>);

impl ServiceId {
    /// Creates a service id from an explicit name.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// Returns the id derived from the type `S`.
    #[must_use]
    pub fn of<S: ?Sized + 'static>() -> Self {
        Self(Cow::Borrowed(std::any::type_name::<S>()))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for ServiceId {
    fn from(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }
}

impl From<String> for ServiceId {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

/// Where a parameter's raw value is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterSource {
    /// Path segment captured by the router.
    #[default]
    Path,
    /// Query string parameter.
    Query,
    /// HTTP header.
    Header,
    /// Top-level field of a JSON object body.
    Body,
}

impl fmt::Display for ParameterSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path => write!(f, "path"),
            Self::Query => write!(f, "query"),
            Self::Header => write!(f, "header"),
            Self::Body => write!(f, "body"),
        }
    }
}

/// A declared endpoint parameter.
///
/// Parameters default to the path source and are required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointParameter {
    name: String,
    type_key: String,
    #[serde(default, rename = "in")]
    source: ParameterSource,
    #[serde(default = "default_required")]
    required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

fn default_required() -> bool {
    true
}

impl EndpointParameter {
    /// Creates a required path parameter with the given type key.
    pub fn new(name: impl Into<String>, type_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_key: type_key.into(),
            source: ParameterSource::Path,
            required: true,
            description: None,
        }
    }

    /// Sets the parameter source.
    #[must_use]
    pub fn with_source(mut self, source: ParameterSource) -> Self {
        self.source = source;
        self
    }

    /// Reads the parameter from the query string.
    #[must_use]
    pub fn in_query(self) -> Self {
        self.with_source(ParameterSource::Query)
    }

    /// Reads the parameter from a header.
    #[must_use]
    pub fn in_header(self) -> Self {
        self.with_source(ParameterSource::Header)
    }

    /// Reads the parameter from the JSON body.
    #[must_use]
    pub fn in_body(self) -> Self {
        self.with_source(ParameterSource::Body)
    }

    /// Marks the parameter as optional.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Sets a human readable description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Parameter name, also the attribute key the typed value is stored under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key of the type mapper that converts this parameter.
    #[must_use]
    pub fn type_key(&self) -> &str {
        &self.type_key
    }

    /// Where the raw value is read from.
    #[must_use]
    pub const fn source(&self) -> ParameterSource {
        self.source
    }

    /// Whether the parameter must be present.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.required
    }

    /// Optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// The service and method an endpoint dispatches to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointHandler {
    service: ServiceId,
    method: String,
}

impl EndpointHandler {
    /// Creates a handler reference from a service id and method name.
    pub fn new(service: impl Into<ServiceId>, method: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            method: method.into(),
        }
    }

    /// Creates a handler reference to a method on the service type `S`.
    pub fn of<S: ?Sized + 'static>(method: impl Into<String>) -> Self {
        Self {
            service: ServiceId::of::<S>(),
            method: method.into(),
        }
    }

    /// The owning service.
    #[must_use]
    pub const fn service(&self) -> &ServiceId {
        &self.service
    }

    /// The method name.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }
}

/// Routing metadata describing how a request is handled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    handler: EndpointHandler,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mask: Option<String>,
    #[serde(default)]
    parameters: Vec<EndpointParameter>,
}

impl Endpoint {
    /// Creates an endpoint with no parameters.
    #[must_use]
    pub fn new(handler: EndpointHandler) -> Self {
        Self {
            handler,
            mask: None,
            parameters: Vec::new(),
        }
    }

    /// Sets the route mask (e.g. `/users/{id}`), informational only.
    #[must_use]
    pub fn with_mask(mut self, mask: impl Into<String>) -> Self {
        self.mask = Some(mask.into());
        self
    }

    /// Declares a parameter.
    #[must_use]
    pub fn with_parameter(mut self, parameter: EndpointParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// The handler reference.
    #[must_use]
    pub const fn handler(&self) -> &EndpointHandler {
        &self.handler
    }

    /// The route mask, if any.
    #[must_use]
    pub fn mask(&self) -> Option<&str> {
        self.mask.as_deref()
    }

    /// Declared parameters in declaration order.
    #[must_use]
    pub fn parameters(&self) -> &[EndpointParameter] {
        &self.parameters
    }

    /// Looks up a declared parameter by name.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&EndpointParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}
