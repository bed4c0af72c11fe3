//! # Trellis Mapping
//!
//! Typed request parameters for the Trellis pipeline.
//!
//! An [`Endpoint`](trellis_core::Endpoint) declares its parameters by name,
//! type key and source. Before the endpoint runs, the
//! [`RequestParametersDecorator`] reads each raw value, converts it with the
//! [`TypeMapper`] registered under the parameter's type key, and stores the
//! result as a request attribute.
//!
//! | Type key | Mapper | Value |
//! |----------|--------|-------|
//! | `int` | [`IntegerMapper`] | [`Value::Int`](trellis_core::Value::Int) |
//! | `float` | [`FloatMapper`] | [`Value::Float`](trellis_core::Value::Float) |
//! | `string` | [`StringMapper`] | [`Value::String`](trellis_core::Value::String) |
//!
//! [`BooleanMapper`] is available but not installed by default.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use trellis_core::Value;
//! use trellis_mapping::{BooleanMapper, CoercionPolicy, ConversionError, TypeMapperRegistry};
//!
//! let mut registry = TypeMapperRegistry::with_defaults(CoercionPolicy::Strict);
//! registry.register("bool", Arc::new(BooleanMapper::new(CoercionPolicy::Strict)));
//! registry.register(
//!     "upper",
//!     Arc::new(|raw: &str| -> Result<Value, ConversionError> { Ok(Value::from(raw.to_uppercase())) }),
//! );
//!
//! assert_eq!(registry.normalize("bool", "on").unwrap(), Value::Bool(true));
//! assert_eq!(registry.normalize("upper", "ab").unwrap(), Value::from("AB"));
//! assert!(registry.normalize("int", "12px").is_err());
//! ```

#![doc(html_root_url = "https://docs.rs/trellis-mapping/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod decorator;
pub mod error;
pub mod mapper;
pub mod parameters;
pub mod registry;
pub mod source;

pub use decorator::{RequestParametersDecorator, DEFAULT_PRIORITY};
pub use error::{ConversionError, MappingError, UnmappedParameter};
pub use mapper::{
    BooleanMapper, BuiltinMapper, CoercionPolicy, FloatMapper, IntegerMapper, StringMapper,
    TypeMapper,
};
pub use parameters::ParameterMapper;
pub use registry::{TypeMapperRegistry, DEFAULT_TYPES};
pub use source::RawParameters;
