//! Typed configuration for Trellis.
//!
//! This crate provides the configuration that decides how a Trellis pipeline
//! is wired, with support for:
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//!
//! # Overview
//!
//! [`TrellisConfig`] holds two sections:
//!
//! - [`MappingConfig`] - which type keys resolve to which mapper, the coercion
//!   policy, and the priority of the parameter mapping decorator
//! - [`TelemetrySection`] - logging and metrics settings
//!
//! # Example
//!
//! ```no_run
//! use trellis_config::ConfigLoader;
//!
//! # fn main() -> Result<(), trellis_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_defaults()
//!     .with_optional_file("trellis.toml")?
//!     .with_env_prefix("TRELLIS")
//!     .load()?;
//!
//! println!("mapping {} type keys", config.mapping.types.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [mapping]
//! enabled = true
//! coercion = "permissive"
//! priority = 100
//!
//! [mapping.types]
//! int = "integer"
//! float = "float"
//! string = "string"
//! bool = "boolean"
//!
//! [telemetry.logging]
//! level = "info"
//! json_format = true
//!
//! [telemetry.metrics]
//! enabled = true
//! ```
//!
//! # Environment Variables
//!
//! With prefix `TRELLIS`, any field can be overridden:
//!
//! - `TRELLIS__MAPPING__COERCION=strict`
//! - `TRELLIS__MAPPING__TYPES__UUID=string`
//! - `TRELLIS__MAPPING__TYPES__FLOAT=none` (removes the key)
//! - `TRELLIS__TELEMETRY__LOGGING__LEVEL=debug`

#![doc(html_root_url = "https://docs.rs/trellis-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::{TrellisConfig, TrellisConfigBuilder};
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{MappingConfig, TelemetrySection};
