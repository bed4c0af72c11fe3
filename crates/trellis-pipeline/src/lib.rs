//! # Trellis Pipeline
//!
//! Priority-ordered decorator chains around endpoint invocation.
//!
//! ## Stages
//!
//! ```text
//! Request → [request] → router → [handler_request] → endpoint
//!                                                        ↓
//! Response ← [response] ← [handler_response] ←───────────┘
//!
//! errors:  endpoint ──► [handler_exception] ──► (unhandled) ──► [exception]
//! ```
//!
//! | Stage | Trait | Notes |
//! |-------|-------|-------|
//! | `request` | [`RequestDecorator`] | may short-circuit with a response |
//! | `handler_request` | [`HandlerRequestDecorator`] | short-circuit is a contract violation |
//! | `handler_response` | [`HandlerResponseDecorator`] | |
//! | `response` | [`ResponseDecorator`] | also sees short-circuited responses |
//! | `handler_exception` | [`HandlerExceptionDecorator`] | endpoint errors |
//! | `exception` | [`ExceptionDecorator`] | routing, handler-level and unrecovered errors |
//!
//! Within a stage decorators run by descending priority; equal priorities
//! keep registration order. Chains are built once by
//! [`DecoratorRegistry::distribute`] and never change afterwards.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use trellis_pipeline::decorator::Capability;
//! use trellis_pipeline::decorators::ErrorEnvelopeDecorator;
//! use trellis_pipeline::DecoratorRegistry;
//!
//! let mut registry = DecoratorRegistry::new();
//! registry.register(Arc::new(ErrorEnvelopeDecorator::new()), 0);
//!
//! let chains = registry.distribute();
//! assert_eq!(chains.names(Capability::Exception), vec!["error_envelope"]);
//! assert_eq!(chains.names(Capability::HandlerException), vec!["error_envelope"]);
//! ```

#![doc(html_root_url = "https://docs.rs/trellis-pipeline/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod chain;
pub mod decorator;
pub mod decorators;
pub mod dispatcher;
pub mod handler;
pub mod registry;
pub mod router;

pub use chain::{Chain, ChainEntry, Decoration, Recovery};
pub use decorator::{
    classify, Capabilities, Capability, CapabilitySet, Decorator, DecoratorResult,
    ExceptionDecorator, HandlerExceptionDecorator, HandlerRequestDecorator,
    HandlerResponseDecorator, RequestDecorator, RequestFlow, ResponseDecorator,
};
pub use dispatcher::Dispatcher;
pub use handler::DecorableHandler;
pub use registry::{Chains, DecoratorRegistry};
pub use router::Router;
