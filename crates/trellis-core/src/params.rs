//! Path parameter storage.
//!
//! Routing hands the core the raw path segments it matched. They are kept as
//! strings until parameter mapping converts them into typed [`Value`](crate::Value)s.

use smallvec::SmallVec;

/// Maximum number of parameters stored inline (stack allocated).
const INLINE_PARAMS: usize = 4;

/// Raw path parameters captured by the router.
///
/// # Example
///
/// ```rust
/// use trellis_core::PathParams;
///
/// let mut params = PathParams::new();
/// params.push("id", "7");
///
/// assert_eq!(params.get("id"), Some("7"));
/// assert_eq!(params.get("missing"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathParams {
    inner: SmallVec<[(String, String); INLINE_PARAMS]>,
}

impl PathParams {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter. A later value for the same name shadows earlier ones.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Returns the raw value for a parameter.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Iterates over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl<N, V> FromIterator<(N, V)> for PathParams
where
    N: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self {
            inner: iter
                .into_iter()
                .map(|(n, v)| (n.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_get() {
        let mut params = PathParams::new();
        assert!(params.is_empty());

        params.push("user_id", "42");
        params.push("post_id", "7");

        assert_eq!(params.len(), 2);
        assert_eq!(params.get("user_id"), Some("42"));
        assert_eq!(params.get("post_id"), Some("7"));
        assert_eq!(params.get("other"), None);
    }

    #[test]
    fn test_later_value_shadows() {
        let mut params = PathParams::new();
        params.push("id", "1");
        params.push("id", "2");
        assert_eq!(params.get("id"), Some("2"));
    }

    #[test]
    fn test_from_iterator_keeps_order() {
        let params: PathParams = [("a", "1"), ("b", "2"), ("c", "3")].into_iter().collect();
        let names: Vec<_> = params.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }
}
