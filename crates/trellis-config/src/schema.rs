//! Configuration schema types.
//!
//! This module defines the structure of all configuration sections.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use trellis_mapping::{BuiltinMapper, CoercionPolicy, DEFAULT_PRIORITY, DEFAULT_TYPES};
use trellis_telemetry::{LogConfig, MetricsConfig};

/// Parameter mapping configuration section.
///
/// `types` maps a type key, as endpoints declare it, to a built-in mapper.
/// Mapping is installed only when it is enabled and `types` is not empty.
///
/// # Example
///
/// ```
/// use trellis_config::MappingConfig;
/// use trellis_mapping::BuiltinMapper;
///
/// let config = MappingConfig::default();
/// assert_eq!(config.types.get("int"), Some(&BuiltinMapper::Integer));
/// assert_eq!(config.priority, 100);
/// assert!(config.is_active());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MappingConfig {
    /// Whether parameter mapping is installed at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Type key to mapper.
    #[serde(default = "default_types")]
    pub types: IndexMap<String, BuiltinMapper>,

    /// How the built-in mappers treat malformed input.
    #[serde(default)]
    pub coercion: CoercionPolicy,

    /// Handler request priority of the mapping decorator.
    #[serde(default = "default_priority")]
    pub priority: i32,
}

impl MappingConfig {
    /// Returns true if mapping should be installed.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.enabled && !self.types.is_empty()
    }
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            types: default_types(),
            coercion: CoercionPolicy::default(),
            priority: default_priority(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_types() -> IndexMap<String, BuiltinMapper> {
    DEFAULT_TYPES
        .iter()
        .map(|(key, mapper)| ((*key).to_string(), *mapper))
        .collect()
}

fn default_priority() -> i32 {
    DEFAULT_PRIORITY
}

/// Telemetry configuration section.
///
/// ```toml
/// [telemetry.logging]
/// level = "trellis_pipeline=debug,info"
/// json_format = false
///
/// [telemetry.metrics]
/// enabled = false
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct TelemetrySection {
    /// Logging configuration.
    #[serde(default)]
    pub logging: LogConfig,

    /// Metrics configuration.
    #[serde(default)]
    pub metrics: MetricsConfig,
}
