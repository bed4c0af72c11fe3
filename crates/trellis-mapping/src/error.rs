//! Mapping error types.

use thiserror::Error;
use trellis_core::DispatchError;

/// A raw value that a [`TypeMapper`](crate::TypeMapper) refused to convert.
///
/// Only strict mappers produce this; permissive mappers are total.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected {expected}, got '{raw}'")]
pub struct ConversionError {
    raw: String,
    expected: &'static str,
}

impl ConversionError {
    /// Creates a conversion error for `raw`, which should have been `expected`.
    #[must_use]
    pub fn new(raw: impl Into<String>, expected: &'static str) -> Self {
        Self {
            raw: raw.into(),
            expected,
        }
    }

    /// The rejected input.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Description of the accepted input, e.g. `an integer`.
    #[must_use]
    pub const fn expected(&self) -> &'static str {
        self.expected
    }
}

/// Errors from [`TypeMapperRegistry::normalize`](crate::TypeMapperRegistry::normalize).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// No mapper is registered under the key.
    #[error("no type mapper registered for '{type_key}'")]
    UnknownTypeKey {
        /// The requested key.
        type_key: String,
    },

    /// The mapper rejected the value.
    #[error("cannot map value as '{type_key}': {source}")]
    Conversion {
        /// Key of the mapper that failed.
        type_key: String,
        /// What the mapper objected to.
        #[source]
        source: ConversionError,
    },
}

impl MappingError {
    /// Creates an unknown type key error.
    #[must_use]
    pub fn unknown_type_key(type_key: impl Into<String>) -> Self {
        Self::UnknownTypeKey {
            type_key: type_key.into(),
        }
    }
}

/// An endpoint parameter whose declared type has no mapper.
///
/// Returned by [`ParameterMapper::check_endpoint`](crate::ParameterMapper::check_endpoint).
/// Like [`MappingError::UnknownTypeKey`] it is a wiring error, whether or not
/// the parameter is present on a given request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parameter '{parameter}' uses unknown type key '{type_key}'")]
pub struct UnmappedParameter {
    parameter: String,
    type_key: String,
}

impl UnmappedParameter {
    /// Creates the error for `parameter` declared as `type_key`.
    #[must_use]
    pub fn new(parameter: impl Into<String>, type_key: impl Into<String>) -> Self {
        Self {
            parameter: parameter.into(),
            type_key: type_key.into(),
        }
    }

    /// The parameter name.
    #[must_use]
    pub fn parameter(&self) -> &str {
        &self.parameter
    }

    /// The unregistered type key.
    #[must_use]
    pub fn type_key(&self) -> &str {
        &self.type_key
    }
}

impl From<UnmappedParameter> for DispatchError {
    fn from(error: UnmappedParameter) -> Self {
        Self::UnknownTypeKey {
            type_key: error.type_key,
        }
    }
}

impl From<MappingError> for DispatchError {
    fn from(error: MappingError) -> Self {
        match error {
            MappingError::UnknownTypeKey { type_key } => Self::UnknownTypeKey { type_key },
            MappingError::Conversion { type_key, source } => {
                trellis_core::ApiError::validation(format!(
                    "cannot map value as '{type_key}': {source}"
                ))
                .into()
            }
        }
    }
}
