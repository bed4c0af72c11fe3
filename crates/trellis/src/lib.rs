//! # Trellis
//!
//! **Priority-ordered decorator pipeline with typed parameter mapping**
//!
//! Trellis wraps endpoint invocation in six decorator chains and converts raw
//! request parameters into typed values before the endpoint runs:
//!
//! - **Ordered Chains**: decorators run by descending priority, ties in
//!   registration order
//! - **Short-Circuiting**: request decorators may answer without reaching
//!   the endpoint
//! - **Error Recovery**: exception decorators turn errors into responses
//! - **Typed Parameters**: path, query, header and body values converted by
//!   pluggable type mappers
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use trellis::prelude::*;
//!
//! let users = FnService::new().method("show", |req, _| {
//!     match req.attribute("id") {
//!         Some(Value::Int(7)) => Ok(Reply::Data(serde_json::json!({ "name": "Ada" }))),
//!         _ => Err(ApiError::not_found_resource("User", "unknown")),
//!     }
//! });
//!
//! let dispatcher = Trellis::builder()
//!     .service_named("users", Arc::new(users))
//!     .decorator(Arc::new(ErrorEnvelopeDecorator::new()), 0)
//!     .router(|req: &ApiRequest| -> Result<ApiRequest, ApiError> {
//!         let id = req.path().trim_start_matches("/users/");
//!         let mut params = PathParams::new();
//!         params.push("id", id);
//!         Ok(req
//!             .clone()
//!             .with_path_params(params)
//!             .with_endpoint(
//!                 Endpoint::new(EndpointHandler::new("users", "show"))
//!                     .with_parameter(EndpointParameter::new("id", "int")),
//!             ))
//!     })
//!     .build()
//!     .unwrap();
//!
//! let response = dispatcher
//!     .dispatch_api(ApiRequest::get("/users/7"), ApiResponse::new())
//!     .unwrap();
//! assert_eq!(response.status(), 200);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Request → [request] → router → [handler_request] → endpoint
//!                                  (mapping @ 100)       ↓
//! Response ← [response] ← [handler_response] ←───────────┘
//! ```

#![doc(html_root_url = "https://docs.rs/trellis/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod builder;
mod error;

pub use builder::{Trellis, TrellisBuilder};
pub use error::BuildError;

// Re-export core types
pub use trellis_core as core;

// Re-export pipeline types
pub use trellis_pipeline as pipeline;

// Re-export mapping types
pub use trellis_mapping as mapping;

// Re-export configuration types
pub use trellis_config as config;

// Re-export telemetry types
pub use trellis_telemetry as telemetry;

/// Installs logging and metrics as described by `config.telemetry`.
///
/// # Errors
///
/// Returns the first subsystem that fails to initialize.
pub fn init_telemetry(config: &config::TrellisConfig) -> telemetry::TelemetryResult<()> {
    telemetry::init_telemetry(&config.telemetry.logging, &config.telemetry.metrics)
}

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use trellis::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{BuildError, Trellis, TrellisBuilder};

    pub use trellis_core::{
        ApiError, ApiRequest, ApiResponse, DispatchError, Endpoint, EndpointHandler,
        EndpointParameter, Entity, FieldErrors, FnService, PathParams, Reply, Service,
        ServiceRegistry, Value,
    };

    // Re-export decorator traits and results
    pub use trellis_pipeline::{
        Capabilities, Decorator, DecoratorResult, Dispatcher, ExceptionDecorator,
        HandlerExceptionDecorator, HandlerRequestDecorator, HandlerResponseDecorator,
        RequestDecorator, RequestFlow, ResponseDecorator, Router,
    };

    // Re-export built-in decorators
    pub use trellis_pipeline::decorators::{
        ErrorEnvelopeDecorator, FnRequestDecorator, FnResponseDecorator,
    };

    // Re-export mapping types
    pub use trellis_mapping::{CoercionPolicy, ConversionError, TypeMapper};

    // Re-export configuration types
    pub use trellis_config::{ConfigLoader, TrellisConfig};
}
