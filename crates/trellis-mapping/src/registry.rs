//! Type mapper registry.

use crate::error::MappingError;
use crate::mapper::{BuiltinMapper, CoercionPolicy, TypeMapper};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use trellis_core::Value;
use trellis_telemetry::logging::fields;

/// Type keys installed by [`TypeMapperRegistry::with_defaults`].
pub const DEFAULT_TYPES: [(&str, BuiltinMapper); 3] = [
    ("int", BuiltinMapper::Integer),
    ("float", BuiltinMapper::Float),
    ("string", BuiltinMapper::String),
];

/// Type mappers keyed by type name.
///
/// Populated at startup and read-only afterwards.
///
/// # Example
///
/// ```
/// use trellis_core::Value;
/// use trellis_mapping::{CoercionPolicy, MappingError, TypeMapperRegistry};
///
/// let registry = TypeMapperRegistry::with_defaults(CoercionPolicy::Permissive);
/// assert_eq!(registry.normalize("int", "42").unwrap(), Value::Int(42));
/// assert!(matches!(
///     registry.normalize("date", "2024-01-01"),
///     Err(MappingError::UnknownTypeKey { .. })
/// ));
/// ```
#[derive(Clone, Default)]
pub struct TypeMapperRegistry {
    mappers: BTreeMap<String, Arc<dyn TypeMapper>>,
}

impl TypeMapperRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with `int`, `float` and `string`.
    #[must_use]
    pub fn with_defaults(policy: CoercionPolicy) -> Self {
        let mut registry = Self::new();
        for (key, builtin) in DEFAULT_TYPES {
            registry.register(key, builtin.build(policy));
        }
        registry
    }

    /// Registers `mapper` under `type_key`, replacing any previous mapper.
    pub fn register(&mut self, type_key: impl Into<String>, mapper: Arc<dyn TypeMapper>) {
        let type_key = type_key.into();
        if self.mappers.insert(type_key.clone(), mapper).is_some() {
            debug!({ fields::TYPE_KEY } = %type_key, "replaced type mapper");
        }
    }

    /// Looks up the mapper for `type_key`.
    #[must_use]
    pub fn get(&self, type_key: &str) -> Option<&Arc<dyn TypeMapper>> {
        self.mappers.get(type_key)
    }

    /// Converts `raw` with the mapper registered under `type_key`.
    ///
    /// # Errors
    ///
    /// [`MappingError::UnknownTypeKey`] if nothing is registered under the
    /// key, [`MappingError::Conversion`] if the mapper rejects the value.
    pub fn normalize(&self, type_key: &str, raw: &str) -> Result<Value, MappingError> {
        let mapper = self
            .mappers
            .get(type_key)
            .ok_or_else(|| MappingError::unknown_type_key(type_key))?;
        mapper
            .normalize(raw)
            .map_err(|source| MappingError::Conversion {
                type_key: type_key.to_string(),
                source,
            })
    }

    /// Returns true if a mapper is registered under `type_key`.
    #[must_use]
    pub fn contains(&self, type_key: &str) -> bool {
        self.mappers.contains_key(type_key)
    }

    /// Registered keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.mappers.keys().map(String::as_str)
    }

    /// Number of registered mappers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mappers.len()
    }

    /// Returns true if no mapper is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mappers.is_empty()
    }
}

impl fmt::Debug for TypeMapperRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.mappers.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConversionError;
    use crate::mapper::StringMapper;

    #[test]
    fn test_defaults() {
        let registry = TypeMapperRegistry::with_defaults(CoercionPolicy::Permissive);
        assert_eq!(registry.keys().collect::<Vec<_>>(), vec!["float", "int", "string"]);
        assert!(!registry.contains("bool"));
    }

    #[test]
    fn test_int_normalizes() {
        let registry = TypeMapperRegistry::with_defaults(CoercionPolicy::Permissive);
        assert_eq!(registry.normalize("int", "42").unwrap(), Value::Int(42));
    }

    #[test]
    fn test_unknown_type_key() {
        let registry = TypeMapperRegistry::with_defaults(CoercionPolicy::Permissive);
        let err = registry.normalize("date", "2024-01-01").unwrap_err();
        assert_eq!(err, MappingError::unknown_type_key("date"));
    }

    #[test]
    fn test_register_overwrites() {
        let mut registry = TypeMapperRegistry::with_defaults(CoercionPolicy::Permissive);
        registry.register("int", Arc::new(StringMapper));
        assert_eq!(registry.len(), 3);
        assert_eq!(
            registry.normalize("int", "42").unwrap(),
            Value::String("42".into())
        );
    }

    #[test]
    fn test_strict_conversion_error() {
        let registry = TypeMapperRegistry::with_defaults(CoercionPolicy::Strict);
        match registry.normalize("float", "x").unwrap_err() {
            MappingError::Conversion { type_key, source } => {
                assert_eq!(type_key, "float");
                assert_eq!(source, ConversionError::new("x", "a finite number"));
            }
            other => panic!("unexpected {other}"),
        }
    }

    #[test]
    fn test_debug_lists_keys() {
        let registry = TypeMapperRegistry::with_defaults(CoercionPolicy::Permissive);
        assert_eq!(format!("{registry:?}"), r#"{"float", "int", "string"}"#);
    }
}
