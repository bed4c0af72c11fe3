//! Built-in decorators.
//!
//! - [`error_envelope`] - turns domain errors into JSON error envelope responses
//! - [`func`] - closure-backed request and response decorators

pub mod error_envelope;
pub mod func;

pub use error_envelope::ErrorEnvelopeDecorator;
pub use func::{FnRequestDecorator, FnResponseDecorator};
