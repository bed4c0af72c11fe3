//! # Trellis Core
//!
//! Core types shared by every Trellis crate.
//!
//! This crate provides the values that flow through the decoration pipeline:
//!
//! - [`ApiRequest`] - Immutable request value with attributes and a bound [`Endpoint`]
//! - [`ApiResponse`] - Immutable response value with an optional [`Entity`]
//! - [`Endpoint`] - Routing metadata naming the target service, method and parameters
//! - [`Value`] - Typed attribute value produced by parameter mapping
//! - [`ApiError`] / [`DispatchError`] - Domain errors and pipeline errors
//! - [`Service`] / [`ServiceRegistry`] - Endpoint handlers resolved by service id
//!
//! Every `with_*` method consumes the value and returns a new one. Nothing in
//! the pipeline mutates a request or response in place.

#![doc(html_root_url = "https://docs.rs/trellis-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod endpoint;
mod error;
mod params;
mod reply;
mod request;
mod response;
pub mod service;
mod value;

pub use endpoint::{Endpoint, EndpointHandler, EndpointParameter, ParameterSource, ServiceId};
pub use error::{
    ApiError, ApiResult, DispatchError, ErrorCategory, ErrorDetail, ErrorEnvelope, FieldErrors,
};
pub use params::PathParams;
pub use reply::{HandlerResult, Reply};
pub use request::ApiRequest;
pub use response::{ApiResponse, Entity};
pub use service::{FnService, Service, ServiceRegistry};
pub use value::Value;
