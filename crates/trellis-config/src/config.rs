//! Main configuration types.
//!
//! This module provides the top-level [`TrellisConfig`] struct and its builder.

use serde::{Deserialize, Serialize};
use trellis_telemetry::LogConfig;

use crate::{ConfigError, MappingConfig, TelemetrySection};

/// Complete Trellis configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load configuration from files
/// and environment variables.
///
/// # Example
///
/// ```
/// use trellis_config::TrellisConfig;
///
/// let config = TrellisConfig::default();
/// assert!(config.mapping.enabled);
/// assert_eq!(config.telemetry.logging.level, "info");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct TrellisConfig {
    /// Parameter mapping configuration.
    #[serde(default)]
    pub mapping: MappingConfig,

    /// Telemetry configuration (logging, metrics).
    #[serde(default)]
    pub telemetry: TelemetrySection,
}

impl TrellisConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> TrellisConfigBuilder {
        TrellisConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidTypeKey` if a mapping type key is blank
    /// or contains whitespace, and `ConfigError::InvalidValue` if:
    /// - The log level is not a valid filter directive
    /// - A metrics bucket is not a positive finite number
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(key) = self
            .mapping
            .types
            .keys()
            .find(|key| key.is_empty() || key.chars().any(char::is_whitespace))
        {
            return Err(ConfigError::invalid_type_key(key.as_str()));
        }

        self.telemetry
            .logging
            .validate()
            .map_err(|e| ConfigError::invalid_value("telemetry.logging.level", e.to_string()))?;

        if self
            .telemetry
            .metrics
            .duration_buckets
            .iter()
            .any(|b| !b.is_finite() || *b <= 0.0)
        {
            return Err(ConfigError::invalid_value(
                "telemetry.metrics.duration_buckets",
                "buckets must be positive finite numbers",
            ));
        }

        Ok(())
    }

    /// Create a development configuration preset.
    ///
    /// - Pretty log formatting at debug level
    /// - Metrics recorder disabled
    ///
    /// # Example
    ///
    /// ```
    /// use trellis_config::TrellisConfig;
    ///
    /// let config = TrellisConfig::development();
    /// assert_eq!(config.telemetry.logging.level, "debug");
    /// assert!(!config.telemetry.metrics.enabled);
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.telemetry.logging = LogConfig::development();
        config.telemetry.metrics.enabled = false;
        config
    }

    /// Create a production configuration preset.
    ///
    /// - JSON log formatting at info level
    /// - Strict parameter coercion
    ///
    /// # Example
    ///
    /// ```
    /// use trellis_config::TrellisConfig;
    /// use trellis_mapping::CoercionPolicy;
    ///
    /// let config = TrellisConfig::production();
    /// assert!(config.telemetry.logging.json_format);
    /// assert_eq!(config.mapping.coercion, CoercionPolicy::Strict);
    /// ```
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.telemetry.logging = LogConfig::production();
        config.mapping.coercion = trellis_mapping::CoercionPolicy::Strict;
        config
    }
}

/// Builder for [`TrellisConfig`].
#[derive(Debug, Default)]
pub struct TrellisConfigBuilder {
    mapping: Option<MappingConfig>,
    telemetry: Option<TelemetrySection>,
}

impl TrellisConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the mapping configuration.
    #[must_use]
    pub fn mapping(mut self, mapping: MappingConfig) -> Self {
        self.mapping = Some(mapping);
        self
    }

    /// Set the telemetry configuration.
    #[must_use]
    pub fn telemetry(mut self, telemetry: TelemetrySection) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Build the configuration.
    ///
    /// Any unset sections will use their default values.
    #[must_use]
    pub fn build(self) -> TrellisConfig {
        TrellisConfig {
            mapping: self.mapping.unwrap_or_default(),
            telemetry: self.telemetry.unwrap_or_default(),
        }
    }
}
