//! Errors raised while loading or validating a [`TrellisConfig`](crate::TrellisConfig).

use std::path::PathBuf;
use thiserror::Error;

/// Why a configuration could not be produced.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required configuration file does not exist.
    #[error("no trellis configuration at {}", path.display())]
    FileNotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// The configuration file exists but could not be read.
    #[error("cannot read trellis configuration {}", path.display())]
    ReadError {
        /// Path of the file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Only TOML and JSON sources are understood.
    #[error("'{origin}' is neither TOML nor JSON")]
    UnsupportedFormat {
        /// File path or format name that was given.
        origin: String,
    },

    /// Malformed TOML, including unknown sections and unknown mapper names.
    #[error("malformed TOML configuration: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Malformed JSON, including unknown sections and unknown mapper names.
    #[error("malformed JSON configuration: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A `.env` file could not be loaded.
    #[error("cannot load env file: {0}")]
    DotenvError(#[from] dotenvy::Error),

    /// A `[mapping.types]` key that no endpoint parameter could ever name.
    #[error("mapping type key '{type_key}' must be non-empty and free of whitespace")]
    InvalidTypeKey {
        /// The offending key.
        type_key: String,
    },

    /// A telemetry setting outside its accepted range.
    #[error("invalid {field}: {reason}")]
    InvalidValue {
        /// Dotted path of the setting.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// An environment override whose value does not parse.
    #[error("{var}='{value}': expected {expected}")]
    EnvParseError {
        /// Full variable name, prefix included.
        var: String,
        /// Value as found in the environment.
        value: String,
        /// Accepted values.
        expected: &'static str,
    },
}

impl ConfigError {
    /// A required file is missing.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// A file could not be read.
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }

    /// A source is neither TOML nor JSON.
    pub fn unsupported_format(origin: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            origin: origin.into(),
        }
    }

    /// A configured type key is blank or contains whitespace.
    pub fn invalid_type_key(type_key: impl Into<String>) -> Self {
        Self::InvalidTypeKey {
            type_key: type_key.into(),
        }
    }

    /// A telemetry setting is out of range.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// An environment override could not be parsed.
    pub fn env_parse_error(
        var: impl Into<String>,
        value: impl Into<String>,
        expected: &'static str,
    ) -> Self {
        Self::EnvParseError {
            var: var.into(),
            value: value.into(),
            expected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TrellisConfig;

    #[test]
    fn test_invalid_type_key_message() {
        let err = ConfigError::invalid_type_key("user id");
        assert_eq!(
            err.to_string(),
            "mapping type key 'user id' must be non-empty and free of whitespace"
        );
    }

    #[test]
    fn test_coercion_override_message() {
        let err = ConfigError::env_parse_error(
            "TRELLIS__MAPPING__COERCION",
            "lenient",
            "'permissive' or 'strict'",
        );
        assert_eq!(
            err.to_string(),
            "TRELLIS__MAPPING__COERCION='lenient': expected 'permissive' or 'strict'"
        );
    }

    #[test]
    fn test_unknown_mapper_name_is_toml_error() {
        let err: ConfigError = toml::from_str::<TrellisConfig>("[mapping.types]\nwhen = \"date\"")
            .unwrap_err()
            .into();
        assert!(matches!(err, ConfigError::TomlError(_)));
        assert!(err.to_string().starts_with("malformed TOML configuration"));
    }

    #[test]
    fn test_unsupported_format_names_origin() {
        let err = ConfigError::unsupported_format("trellis.yaml");
        assert!(err.to_string().contains("'trellis.yaml'"));
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = ConfigError::file_not_found("/etc/trellis/trellis.toml");
        assert!(err.to_string().contains("/etc/trellis/trellis.toml"));
    }
}
