//! # Trellis Test
//!
//! Test utilities for Trellis pipelines: build a request, send it through a
//! [`Dispatcher`](trellis_pipeline::Dispatcher) in memory, and assert on the
//! result.
//!
//! ## Key Features
//!
//! - **In-Memory Dispatch**: every decorator chain runs, no transport involved
//! - **Request Builder**: headers, JSON or form bodies, path parameters, pre-bound endpoints
//! - **Response Assertions**: status, headers, JSON body and entity fields
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use trellis_core::{ApiError, ApiRequest, Endpoint, EndpointHandler, FnService, Reply, ServiceRegistry};
//! use trellis_pipeline::decorators::ErrorEnvelopeDecorator;
//! use trellis_pipeline::{DecoratorRegistry, Dispatcher};
//! use trellis_test::TestClient;
//!
//! let mut services = ServiceRegistry::new();
//! services.register_named(
//!     "users",
//!     Arc::new(FnService::new().method("show", |_, _| Err(ApiError::not_found_resource("User", "7")))),
//! );
//! let mut decorators = DecoratorRegistry::new();
//! decorators.register(Arc::new(ErrorEnvelopeDecorator::new()), 0);
//!
//! let dispatcher = Dispatcher::new(decorators.distribute(), services).with_router(
//!     |req: &ApiRequest| -> Result<ApiRequest, ApiError> {
//!         Ok(req.clone().with_endpoint(Endpoint::new(EndpointHandler::new("users", "show"))))
//!     },
//! );
//!
//! TestClient::new(dispatcher)
//!     .get("/users/7")
//!     .send()
//!     .assert_status(http::StatusCode::NOT_FOUND)
//!     .assert_json_field("error.code", &serde_json::json!("NOT_FOUND"));
//! ```

#![doc(html_root_url = "https://docs.rs/trellis-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use request::{TestRequest, TestRequestBuilder};
pub use response::TestResponse;
