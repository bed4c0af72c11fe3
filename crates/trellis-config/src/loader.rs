//! Configuration loader with layered approach.
//!
//! This module provides the [`ConfigLoader`] for loading configuration from
//! multiple sources: defaults, files, and environment variables.

use std::env;
use std::fs;
use std::path::Path;

use trellis_mapping::{BuiltinMapper, CoercionPolicy};

use crate::{ConfigError, TrellisConfig};

/// Configuration loader with layered approach.
///
/// The loader applies configuration in layers, with later layers overriding
/// earlier ones:
/// 1. Default values (built into the code)
/// 2. Configuration file (TOML or JSON)
/// 3. Environment variables
///
/// # Example
///
/// ```no_run
/// use trellis_config::ConfigLoader;
///
/// # fn main() -> Result<(), trellis_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_file("trellis.toml")?
///     .with_env_prefix("TRELLIS")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: TrellisConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: TrellisConfig::default(),
            env_prefix: None,
        }
    }

    /// Start with default configuration values.
    ///
    /// This is called automatically by `new()`, but can be chained for clarity.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = TrellisConfig::default();
        self
    }

    /// Start with development preset configuration.
    ///
    /// # Example
    ///
    /// ```
    /// use trellis_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_development()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.telemetry.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = TrellisConfig::development();
        self
    }

    /// Start with production preset configuration.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = TrellisConfig::production();
        self
    }

    /// Load configuration from a file.
    ///
    /// The format is chosen by extension: `.toml` or `.json`. The file
    /// replaces the current configuration; sections it omits take their
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The file does not exist
    /// - The file cannot be read
    /// - The file contains invalid TOML/JSON
    /// - The file contains unknown fields
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        self.config = Self::parse_file(&content, path)?;
        Ok(self)
    }

    /// Load configuration from an optional file.
    ///
    /// If the file exists, loads it. If not, silently continues.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string.
    ///
    /// `format` is `"toml"` or `"json"`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing fails.
    ///
    /// # Example
    ///
    /// ```
    /// use trellis_config::ConfigLoader;
    /// use trellis_mapping::CoercionPolicy;
    ///
    /// let toml = r#"
    ///     [mapping]
    ///     coercion = "strict"
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.mapping.coercion, CoercionPolicy::Strict);
    /// assert_eq!(config.mapping.types.len(), 3);
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            _ => {
                return Err(ConfigError::unsupported_format(format))
            }
        };
        Ok(self)
    }

    /// Set environment variable prefix for overrides.
    ///
    /// Environment variables use the format `PREFIX__SECTION__KEY`.
    /// For example, with prefix "TRELLIS":
    /// - `TRELLIS__MAPPING__COERCION=strict`
    /// - `TRELLIS__MAPPING__TYPES__BOOL=boolean`
    /// - `TRELLIS__TELEMETRY__LOGGING__LEVEL=debug`
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load a `.env` file from the current directory or its parents, if
    /// there is one.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a `.env` file exists but cannot be parsed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(e.into()),
        }
    }

    /// Load a specific env file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing or cannot be parsed.
    pub fn with_dotenv_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        dotenvy::from_path(path.as_ref())?;
        Ok(self)
    }

    /// Finalize and return the loaded configuration.
    ///
    /// Applies environment variable overrides (if a prefix was set) and
    /// validates the final configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Environment variable parsing fails
    /// - Configuration validation fails
    pub fn load(mut self) -> Result<TrellisConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix, env::vars())?;
        }

        self.config.validate()?;
        Ok(self.config)
    }

    /// Finalize without validation.
    #[must_use]
    pub fn load_unvalidated(self) -> TrellisConfig {
        self.config
    }

    // Parse configuration file based on extension
    fn parse_file(content: &str, path: &Path) -> Result<TrellisConfig, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(content)?),
            Some("json") => Ok(serde_json::from_str(content)?),
            _ => Err(ConfigError::unsupported_format(path.display().to_string())),
        }
    }

    fn apply_env_overrides(
        &mut self,
        prefix: &str,
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Result<(), ConfigError> {
        let marker = format!("{prefix}__");
        let mut vars: Vec<_> = vars
            .into_iter()
            .filter(|(k, _)| k.starts_with(&marker))
            .collect();
        // deterministic order when a type is both removed and re-added
        vars.sort();

        for (key, value) in vars {
            self.apply_env_var(&key, &value, prefix)?;
        }
        Ok(())
    }

    // Apply a single environment variable
    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let key_without_prefix = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| {
                ConfigError::env_parse_error(key, value, "a PREFIX__SECTION__KEY variable")
            })?;

        let parts: Vec<&str> = key_without_prefix.split("__").collect();
        let mapping = &mut self.config.mapping;
        let logging = &mut self.config.telemetry.logging;

        match parts.as_slice() {
            // Mapping section
            ["MAPPING", "ENABLED"] => mapping.enabled = parse_bool_var(key, value)?,
            ["MAPPING", "PRIORITY"] => {
                mapping.priority = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, value, "an integer"))?;
            }
            ["MAPPING", "COERCION"] => {
                mapping.coercion = match value.to_lowercase().as_str() {
                    "permissive" => CoercionPolicy::Permissive,
                    "strict" => CoercionPolicy::Strict,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            value,
                            "'permissive' or 'strict'",
                        ))
                    }
                };
            }
            ["MAPPING", "TYPES", type_key] => {
                let type_key = type_key.to_lowercase();
                match value.to_lowercase().as_str() {
                    "" | "none" => {
                        mapping.types.shift_remove(&type_key);
                    }
                    name => {
                        let mapper = parse_mapper(name).ok_or_else(|| {
                            ConfigError::env_parse_error(
                                key,
                                value,
                                "'integer', 'float', 'string', 'boolean' or 'none'",
                            )
                        })?;
                        mapping.types.insert(type_key, mapper);
                    }
                }
            }

            // Telemetry logging
            ["TELEMETRY", "LOGGING", "ENABLED"] => logging.enabled = parse_bool_var(key, value)?,
            ["TELEMETRY", "LOGGING", "LEVEL"] => logging.level = value.to_string(),
            ["TELEMETRY", "LOGGING", "JSON_FORMAT"] => {
                logging.json_format = parse_bool_var(key, value)?;
            }
            ["TELEMETRY", "LOGGING", "SPAN_EVENTS"] => {
                logging.span_events = parse_bool_var(key, value)?;
            }
            ["TELEMETRY", "LOGGING", "FILE_LINE_INFO"] => {
                logging.file_line_info = parse_bool_var(key, value)?;
            }
            ["TELEMETRY", "LOGGING", "INCLUDE_TARGET"] => {
                logging.include_target = parse_bool_var(key, value)?;
            }

            // Telemetry metrics
            ["TELEMETRY", "METRICS", "ENABLED"] => {
                self.config.telemetry.metrics.enabled = parse_bool_var(key, value)?;
            }

            // Unknown key - ignore
            _ => {}
        }

        Ok(())
    }
}

fn parse_mapper(name: &str) -> Option<BuiltinMapper> {
    match name {
        "integer" => Some(BuiltinMapper::Integer),
        "float" => Some(BuiltinMapper::Float),
        "string" => Some(BuiltinMapper::String),
        "boolean" => Some(BuiltinMapper::Boolean),
        _ => None,
    }
}

fn parse_bool_var(key: &str, value: &str) -> Result<bool, ConfigError> {
    parse_bool(value).ok_or_else(|| ConfigError::env_parse_error(key, value, "a boolean"))
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
