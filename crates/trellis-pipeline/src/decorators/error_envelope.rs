//! Error envelope decorator.
//!
//! Recovers every [`ApiError`] into a JSON response carrying the error's
//! status code:
//!
//! ```json
//! {
//!   "error": {
//!     "code": "NOT_FOUND",
//!     "message": "Not found: User '7' not found",
//!     "category": "not_found",
//!     "details": { "resource_type": "User", "resource_id": "7" }
//!   }
//! }
//! ```
//!
//! Internal errors are masked unless [`expose_internal_errors`] is enabled.
//!
//! [`expose_internal_errors`]: ErrorEnvelopeDecorator::expose_internal_errors

use crate::decorator::{
    Capabilities, Decorator, DecoratorResult, ExceptionDecorator, HandlerExceptionDecorator,
};
use std::sync::Arc;
use trellis_core::{ApiError, ApiRequest, ApiResponse, ErrorCategory};

/// Converts errors into error envelope responses at both exception stages.
#[derive(Debug, Clone)]
pub struct ErrorEnvelopeDecorator {
    expose_internal_errors: bool,
    internal_error_message: String,
}

impl Default for ErrorEnvelopeDecorator {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorEnvelopeDecorator {
    /// Masks internal errors.
    #[must_use]
    pub fn new() -> Self {
        Self {
            expose_internal_errors: false,
            internal_error_message: "An internal error occurred".to_string(),
        }
    }

    /// Whether internal error messages reach the client. Development only.
    #[must_use]
    pub fn expose_internal_errors(mut self, expose: bool) -> Self {
        self.expose_internal_errors = expose;
        self
    }

    /// Replaces the message sent for masked internal errors.
    #[must_use]
    pub fn internal_error_message(mut self, message: impl Into<String>) -> Self {
        self.internal_error_message = message.into();
        self
    }

    fn render(&self, error: &ApiError, response: &ApiResponse) -> ApiResponse {
        let mut envelope = error.to_envelope();
        if error.category() == ErrorCategory::Internal && !self.expose_internal_errors {
            envelope.error.message.clone_from(&self.internal_error_message);
            envelope.error.details = None;
        }
        response
            .clone()
            .with_status(error.status_code())
            .with_json(&envelope)
    }
}

impl Decorator for ErrorEnvelopeDecorator {
    fn name(&self) -> &str {
        "error_envelope"
    }

    fn capabilities(self: Arc<Self>) -> Capabilities {
        Capabilities::new()
            .handler_exception(self.clone())
            .exception(self)
    }
}

impl HandlerExceptionDecorator for ErrorEnvelopeDecorator {
    fn decorate_handler_exception(
        &self,
        error: &ApiError,
        _request: &ApiRequest,
        response: &ApiResponse,
    ) -> DecoratorResult<ApiResponse> {
        Ok(self.render(error, response))
    }
}

impl ExceptionDecorator for ErrorEnvelopeDecorator {
    fn decorate_exception(
        &self,
        error: &ApiError,
        _request: &ApiRequest,
        response: &ApiResponse,
    ) -> DecoratorResult<ApiResponse> {
        Ok(self.render(error, response))
    }
}
