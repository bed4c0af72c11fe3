//! Errors raised while wiring a dispatcher.

use thiserror::Error;
use trellis_config::ConfigError;

/// Startup failure. No dispatcher is produced.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The configuration failed validation.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// An endpoint declares a parameter whose type key has no mapper.
    #[error("endpoint '{endpoint}' parameter '{parameter}' uses unknown type key '{type_key}'")]
    UnknownTypeKey {
        /// The endpoint mask, or `service.method` when it has none.
        endpoint: String,
        /// The offending parameter.
        parameter: String,
        /// The unregistered type key.
        type_key: String,
    },
}
