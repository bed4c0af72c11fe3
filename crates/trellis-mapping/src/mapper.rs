//! Type mappers.
//!
//! A [`TypeMapper`] turns one raw string into a typed [`Value`]. The built-in
//! mappers follow a [`CoercionPolicy`]:
//!
//! | Mapper | Permissive | Strict |
//! |--------|------------|--------|
//! | [`IntegerMapper`] | longest integer prefix, `0` if none, saturating; exponents are not read, so `1e3` is `1` | whole input must be an `i64` |
//! | [`FloatMapper`] | longest decimal prefix, `0.0` if none | whole input must be a finite float |
//! | [`StringMapper`] | identity | identity |
//! | [`BooleanMapper`] | unknown words are `false` | unknown words fail |

use crate::error::ConversionError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use trellis_core::Value;

/// Converts a raw parameter value into a typed [`Value`].
///
/// Mappers are stateless and shared between threads.
pub trait TypeMapper: Send + Sync + 'static {
    /// Normalizes `raw`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConversionError`] when the input is rejected.
    fn normalize(&self, raw: &str) -> Result<Value, ConversionError>;
}

impl<F> TypeMapper for F
where
    F: Fn(&str) -> Result<Value, ConversionError> + Send + Sync + 'static,
{
    fn normalize(&self, raw: &str) -> Result<Value, ConversionError> {
        self(raw)
    }
}

/// How built-in mappers treat malformed input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoercionPolicy {
    /// Every input maps to some value.
    #[default]
    Permissive,
    /// Malformed input is a conversion error.
    Strict,
}

impl CoercionPolicy {
    /// Returns true for [`CoercionPolicy::Strict`].
    #[must_use]
    pub const fn is_strict(self) -> bool {
        matches!(self, Self::Strict)
    }
}

/// Names of the built-in mappers, as they appear in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuiltinMapper {
    /// [`IntegerMapper`]
    Integer,
    /// [`FloatMapper`]
    Float,
    /// [`StringMapper`]
    String,
    /// [`BooleanMapper`]
    Boolean,
}

impl BuiltinMapper {
    /// Instantiates the mapper with `policy`.
    #[must_use]
    pub fn build(self, policy: CoercionPolicy) -> Arc<dyn TypeMapper> {
        match self {
            Self::Integer => Arc::new(IntegerMapper::new(policy)),
            Self::Float => Arc::new(FloatMapper::new(policy)),
            Self::String => Arc::new(StringMapper),
            Self::Boolean => Arc::new(BooleanMapper::new(policy)),
        }
    }
}

/// Maps to [`Value::Int`].
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerMapper {
    policy: CoercionPolicy,
}

impl IntegerMapper {
    /// Creates an integer mapper.
    #[must_use]
    pub const fn new(policy: CoercionPolicy) -> Self {
        Self { policy }
    }
}

impl TypeMapper for IntegerMapper {
    fn normalize(&self, raw: &str) -> Result<Value, ConversionError> {
        if self.policy.is_strict() {
            return raw
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| ConversionError::new(raw, "an integer"));
        }
        Ok(Value::Int(integer_prefix(raw)))
    }
}

/// Maps to [`Value::Float`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FloatMapper {
    policy: CoercionPolicy,
}

impl FloatMapper {
    /// Creates a float mapper.
    #[must_use]
    pub const fn new(policy: CoercionPolicy) -> Self {
        Self { policy }
    }
}

impl TypeMapper for FloatMapper {
    fn normalize(&self, raw: &str) -> Result<Value, ConversionError> {
        if self.policy.is_strict() {
            return raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Value::Float)
                .ok_or_else(|| ConversionError::new(raw, "a finite number"));
        }
        Ok(Value::Float(float_prefix(raw)))
    }
}

/// Maps to [`Value::String`] unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringMapper;

impl TypeMapper for StringMapper {
    fn normalize(&self, raw: &str) -> Result<Value, ConversionError> {
        Ok(Value::String(raw.to_string()))
    }
}

/// Maps to [`Value::Bool`].
///
/// `1`, `true`, `yes` and `on` are true; `0`, `false`, `no`, `off` and the
/// empty string are false. Matching ignores case and surrounding whitespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanMapper {
    policy: CoercionPolicy,
}

impl BooleanMapper {
    /// Creates a boolean mapper.
    #[must_use]
    pub const fn new(policy: CoercionPolicy) -> Self {
        Self { policy }
    }
}

impl TypeMapper for BooleanMapper {
    fn normalize(&self, raw: &str) -> Result<Value, ConversionError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Value::Bool(true)),
            "0" | "false" | "no" | "off" | "" => Ok(Value::Bool(false)),
            _ if self.policy.is_strict() => Err(ConversionError::new(raw, "a boolean")),
            _ => Ok(Value::Bool(false)),
        }
    }
}

/// Optional sign followed by the longest run of ASCII digits, after leading
/// whitespace. Returns the byte length of the match, zero if there are no digits.
fn signed_digits(s: &str) -> usize {
    let bytes = s.as_bytes();
    let sign = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let digits = bytes[sign..].iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        0
    } else {
        sign + digits
    }
}

fn integer_prefix(raw: &str) -> i64 {
    let s = raw.trim_start();
    let len = signed_digits(s);
    if len == 0 {
        return 0;
    }
    let (negative, digits) = match s.as_bytes()[0] {
        b'-' => (true, &s[1..len]),
        b'+' => (false, &s[1..len]),
        _ => (false, &s[..len]),
    };
    digits.bytes().fold(0_i64, |acc, b| {
        let digit = i64::from(b - b'0');
        if negative {
            acc.saturating_mul(10).saturating_sub(digit)
        } else {
            acc.saturating_mul(10).saturating_add(digit)
        }
    })
}

fn float_prefix(raw: &str) -> f64 {
    let s = raw.trim_start();
    let bytes = s.as_bytes();

    let sign = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_digits = bytes[sign..].iter().take_while(|b| b.is_ascii_digit()).count();
    let mut end = sign + int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = bytes[end + 1..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return 0.0;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let exponent = signed_digits(&s[end + 1..]);
        if exponent > 0 {
            end += 1 + exponent;
        }
    }

    s[..end]
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(raw: &str) -> i64 {
        IntegerMapper::default()
            .normalize(raw)
            .unwrap()
            .as_i64()
            .unwrap()
    }

    fn float(raw: &str) -> f64 {
        FloatMapper::default()
            .normalize(raw)
            .unwrap()
            .as_f64()
            .unwrap()
    }

    #[test]
    fn test_integer_permissive() {
        assert_eq!(int("42"), 42);
        assert_eq!(int("  -17abc"), -17);
        assert_eq!(int("+8"), 8);
        assert_eq!(int("12.9"), 12);
        assert_eq!(int("abc"), 0);
        assert_eq!(int(""), 0);
        assert_eq!(int("-"), 0);
    }

    #[test]
    fn test_integer_permissive_stops_at_exponent() {
        assert_eq!(int("1e3"), 1);
        assert_eq!(int("-2E2"), -2);
        assert!(IntegerMapper::new(CoercionPolicy::Strict)
            .normalize("1e3")
            .is_err());
    }

    #[test]
    fn test_integer_saturates() {
        assert_eq!(int("99999999999999999999999"), i64::MAX);
        assert_eq!(int("-99999999999999999999999"), i64::MIN);
    }

    #[test]
    fn test_integer_strict() {
        let mapper = IntegerMapper::new(CoercionPolicy::Strict);
        assert_eq!(mapper.normalize(" 7 ").unwrap(), Value::Int(7));
        let err = mapper.normalize("7x").unwrap_err();
        assert_eq!(err.raw(), "7x");
        assert!(mapper.normalize("99999999999999999999999").is_err());
    }

    #[test]
    fn test_float_permissive() {
        assert!((float("3.5") - 3.5).abs() < f64::EPSILON);
        assert!((float("-.5kg") + 0.5).abs() < f64::EPSILON);
        assert!((float("1e3x") - 1000.0).abs() < f64::EPSILON);
        assert!((float("2e") - 2.0).abs() < f64::EPSILON);
        assert!((float("7.") - 7.0).abs() < f64::EPSILON);
        assert!(float(".").abs() < f64::EPSILON);
        assert!(float("nan").abs() < f64::EPSILON);
        assert!(float("1e999").abs() < f64::EPSILON);
    }

    #[test]
    fn test_float_strict() {
        let mapper = FloatMapper::new(CoercionPolicy::Strict);
        assert_eq!(mapper.normalize("0.25").unwrap(), Value::Float(0.25));
        assert!(mapper.normalize("inf").is_err());
        assert!(mapper.normalize("1.2.3").is_err());
    }

    #[test]
    fn test_string_identity() {
        assert_eq!(
            StringMapper.normalize(" as is ").unwrap(),
            Value::String(" as is ".into())
        );
    }

    #[test]
    fn test_boolean() {
        let permissive = BooleanMapper::default();
        assert_eq!(permissive.normalize("Yes").unwrap(), Value::Bool(true));
        assert_eq!(permissive.normalize("off").unwrap(), Value::Bool(false));
        assert_eq!(permissive.normalize("maybe").unwrap(), Value::Bool(false));

        let strict = BooleanMapper::new(CoercionPolicy::Strict);
        assert!(strict.normalize("maybe").is_err());
        assert_eq!(strict.normalize("").unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_closure_mapper() {
        let upper = |raw: &str| -> Result<Value, ConversionError> {
            Ok(Value::String(raw.to_uppercase()))
        };
        assert_eq!(upper.normalize("ab").unwrap(), Value::String("AB".into()));
    }

    #[test]
    fn test_builtin_from_config_name() {
        let parsed: BuiltinMapper = serde_json::from_str("\"integer\"").unwrap();
        assert_eq!(parsed, BuiltinMapper::Integer);
        let mapper = parsed.build(CoercionPolicy::Permissive);
        assert_eq!(mapper.normalize("5").unwrap(), Value::Int(5));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn permissive_integer_is_total(raw in ".*") {
            prop_assert!(IntegerMapper::default().normalize(&raw).is_ok());
        }

        #[test]
        fn permissive_integer_matches_parse_for_valid_input(n in any::<i64>()) {
            prop_assert_eq!(IntegerMapper::default().normalize(&n.to_string()).unwrap(), Value::Int(n));
        }

        #[test]
        fn permissive_float_is_finite(raw in ".*") {
            let value = FloatMapper::default().normalize(&raw).unwrap();
            prop_assert!(value.as_f64().unwrap().is_finite());
        }
    }
}
