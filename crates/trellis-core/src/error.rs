//! Error types for Trellis.
//!
//! Two layers of errors exist:
//!
//! - [`ApiError`] is a domain error raised by endpoints, routers or decorators.
//!   It carries an [`ErrorCategory`] that maps to an HTTP status and can be
//!   turned into a serializable [`ErrorEnvelope`]. Only `ApiError`s are handed
//!   to exception decorators for recovery.
//! - [`DispatchError`] is what dispatch itself returns. Besides wrapping
//!   `ApiError`, it names the wiring and contract failures that are fatal and
//!   never recovered.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Result type alias using [`ApiError`].
pub type ApiResult<T> = Result<T, ApiError>;

/// Categories of domain errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Invalid input, including parameters that fail to convert.
    Validation,
    /// Invalid or missing credentials.
    Authentication,
    /// Permission denied.
    Authorization,
    /// Resource not found.
    NotFound,
    /// Conflicting state.
    Conflict,
    /// Internal failure.
    Internal,
}

impl ErrorCategory {
    /// Returns the HTTP status code for this category.
    #[must_use]
    pub const fn default_status_code(&self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::Authentication => StatusCode::UNAUTHORIZED,
            Self::Authorization => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code used in error envelopes.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION_ERROR",
            Self::Authentication => "AUTHENTICATION_ERROR",
            Self::Authorization => "AUTHORIZATION_DENIED",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::Internal => "INTERNAL_ERROR",
        }
    }
}

/// A domain error that exception decorators may recover from.
///
/// # Example
///
/// ```
/// use trellis_core::{ApiError, ErrorCategory};
///
/// fn find_user(id: i64) -> Result<(), ApiError> {
///     Err(ApiError::not_found_resource("User", id.to_string()))
/// }
///
/// let error = find_user(7).unwrap_err();
/// assert_eq!(error.category(), ErrorCategory::NotFound);
/// assert_eq!(error.status_code().as_u16(), 404);
/// ```
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request validation failed.
    #[error("Validation error: {message}")]
    Validation {
        /// Human-readable error message.
        message: String,
        /// Per-field messages.
        #[source]
        field_errors: Option<FieldErrors>,
    },

    /// Authentication failed.
    #[error("Authentication error: {message}")]
    Authentication {
        /// Human-readable error message.
        message: String,
    },

    /// Authorization denied.
    #[error("Authorization denied: {message}")]
    Authorization {
        /// Human-readable error message.
        message: String,
    },

    /// Resource not found.
    #[error("Not found: {message}")]
    NotFound {
        /// Human-readable error message.
        message: String,
        /// The type of resource that was not found.
        resource_type: Option<String>,
        /// The identifier of the resource.
        resource_id: Option<String>,
    },

    /// Conflicting state.
    #[error("Conflict: {message}")]
    Conflict {
        /// Human-readable error message.
        message: String,
    },

    /// Internal error.
    #[error("Internal error: {message}")]
    Internal {
        /// Human-readable error message.
        message: String,
        /// The underlying error, never exposed to clients.
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl ApiError {
    /// Creates a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field_errors: None,
        }
    }

    /// Creates a validation error with field-specific errors.
    #[must_use]
    pub fn validation_with_fields(message: impl Into<String>, field_errors: FieldErrors) -> Self {
        Self::Validation {
            message: message.into(),
            field_errors: Some(field_errors),
        }
    }

    /// Creates an authentication error.
    #[must_use]
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Creates an authorization error.
    #[must_use]
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization {
            message: message.into(),
        }
    }

    /// Creates a not found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            resource_type: None,
            resource_id: None,
        }
    }

    /// Creates a not found error for a specific resource.
    #[must_use]
    pub fn not_found_resource(
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> Self {
        let resource_type = resource_type.into();
        let resource_id = resource_id.into();
        Self::NotFound {
            message: format!("{resource_type} '{resource_id}' not found"),
            resource_type: Some(resource_type),
            resource_id: Some(resource_id),
        }
    }

    /// Creates a conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error wrapping a source error.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::Authentication { .. } => ErrorCategory::Authentication,
            Self::Authorization { .. } => ErrorCategory::Authorization,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Conflict { .. } => ErrorCategory::Conflict,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.category().default_status_code()
    }

    /// Returns the field errors of a validation error.
    #[must_use]
    pub const fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation { field_errors, .. } => field_errors.as_ref(),
            _ => None,
        }
    }

    /// Converts this error to a serializable envelope.
    #[must_use]
    pub fn to_envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            error: ErrorDetail {
                code: self.category().code().to_string(),
                message: self.to_string(),
                category: self.category(),
                details: self.details(),
            },
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::Validation {
                field_errors: Some(errors),
                ..
            } => serde_json::to_value(errors).ok(),
            Self::NotFound {
                resource_type: Some(rt),
                resource_id: Some(rid),
                ..
            } => Some(serde_json::json!({
                "resource_type": rt,
                "resource_id": rid
            })),
            _ => None,
        }
    }
}

/// Field-specific validation errors, ordered by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("Field validation errors")]
pub struct FieldErrors {
    /// Map of field name to error messages.
    pub fields: BTreeMap<String, Vec<String>>,
}

impl FieldErrors {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an error for a field.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Messages recorded for `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    /// Returns `true` if there are no field errors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the number of fields with errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

/// Serializable error envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// The error details.
    pub error: ErrorDetail,
}

/// Error detail within an envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Error category.
    pub category: ErrorCategory,
    /// Additional error details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Errors returned by dispatch.
///
/// Everything except [`DispatchError::Api`] is a wiring or contract failure:
/// it is fatal for the request and is never passed to exception decorators.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// A decorator returned a value its chain does not accept.
    #[error("decorator '{decorator}' violated the {stage} chain contract: {message}")]
    ContractViolation {
        /// Name of the offending decorator.
        decorator: String,
        /// The chain stage, e.g. `handler_request`.
        stage: &'static str,
        /// What was wrong.
        message: String,
    },

    /// An endpoint returned something that is neither a structured value nor a response.
    #[error("endpoint returned an unsupported value of type {found}")]
    UnsupportedReturnType {
        /// Kind of value that was returned.
        found: &'static str,
    },

    /// No endpoint was bound to the request when one was required.
    #[error("no endpoint is bound to the request")]
    MissingEndpoint,

    /// A parameter declared a type key with no registered mapper.
    #[error("no type mapper registered for '{type_key}'")]
    UnknownTypeKey {
        /// The unknown key.
        type_key: String,
    },

    /// The endpoint's service is not registered.
    #[error("service '{service}' is not registered")]
    ServiceNotFound {
        /// The service id.
        service: String,
    },

    /// The service does not expose the endpoint's method.
    #[error("service '{service}' has no method '{method}'")]
    MethodNotFound {
        /// The service id.
        service: String,
        /// The missing method.
        method: String,
    },

    /// A domain error.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl DispatchError {
    /// Creates a contract violation.
    pub fn contract_violation(
        decorator: impl Into<String>,
        stage: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::ContractViolation {
            decorator: decorator.into(),
            stage,
            message: message.into(),
        }
    }

    /// Whether exception decorators may handle this error.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Api(_))
    }

    /// Returns the wrapped domain error, if any.
    #[must_use]
    pub const fn as_api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(error) => Some(error),
            _ => None,
        }
    }
}
