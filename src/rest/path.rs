//! Dotted attribute paths.
//!
//! A path such as `"user.address.city"` or `"tags.0"` addresses a value
//! inside a resource. Segments are separated by `.`; numeric segments index
//! into arrays and to-many relations.
//!
//! Walking a path follows one rule throughout the crate: a missing *leaf* is
//! `Ok(None)`, while a missing, `null` or scalar *intermediate* is
//! [`ResourceError::ImproperlyConfigured`].

use serde_json::Value;

use crate::rest::ResourceError;

/// A parsed dotted path.
///
/// # Example
///
/// ```rust
/// use rest_resource::rest::AttributePath;
///
/// let path = AttributePath::parse("user.address.city").unwrap();
/// assert_eq!(path.segments(), &["user", "address", "city"]);
/// assert_eq!(path.first(), "user");
/// assert!(AttributePath::parse("user..city").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributePath<'a> {
    raw: &'a str,
    segments: Vec<&'a str>,
}

impl<'a> AttributePath<'a> {
    /// Splits a dotted path into segments.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::ImproperlyConfigured`] for an empty path or
    /// an empty segment.
    pub fn parse(raw: &'a str) -> Result<Self, ResourceError> {
        let segments: Vec<&str> = raw.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(ResourceError::improperly_configured(format!(
                "'{raw}' is not a valid attribute path"
            )));
        }
        Ok(Self { raw, segments })
    }

    /// Returns the path as written.
    #[must_use]
    pub const fn as_str(&self) -> &'a str {
        self.raw
    }

    /// Returns all segments.
    #[must_use]
    pub fn segments(&self) -> &[&'a str] {
        &self.segments
    }

    /// Returns the first segment.
    #[must_use]
    pub fn first(&self) -> &'a str {
        self.segments[0]
    }

    /// Returns the number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always `false`; a parsed path has at least one segment.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }
}

/// Parses an array index segment.
pub(crate) fn parse_index(path: &str, segment: &str) -> Result<usize, ResourceError> {
    segment.parse().map_err(|_| {
        ResourceError::improperly_configured(format!(
            "'{segment}' in '{path}' is not a valid index"
        ))
    })
}

/// Error for descending through a value that is not a container.
pub(crate) fn not_a_container(path: &str, segment: &str) -> ResourceError {
    ResourceError::improperly_configured(format!(
        "cannot read '{segment}' of '{path}': the parent value is not an object or array"
    ))
}

/// Error for descending through a missing intermediate value.
pub(crate) fn missing_intermediate(path: &str, segment: &str) -> ResourceError {
    ResourceError::improperly_configured(format!(
        "cannot descend past '{segment}' of '{path}': the value is missing"
    ))
}

/// Looks up one segment inside a JSON container.
///
/// Returns `Ok(None)` when the container has no such key or index.
pub(crate) fn step<'v>(
    value: &'v Value,
    path: &str,
    segment: &str,
) -> Result<Option<&'v Value>, ResourceError> {
    match value {
        Value::Object(map) => Ok(map.get(segment)),
        Value::Array(items) => Ok(items.get(parse_index(path, segment)?)),
        _ => Err(not_a_container(path, segment)),
    }
}

/// Walks the remaining `segments` below `value`.
///
/// `value` is the already-resolved value of the segment preceding
/// `segments`.
pub(crate) fn walk_value(
    value: &Value,
    path: &str,
    segments: &[&str],
) -> Result<Option<Value>, ResourceError> {
    let mut current = value;
    for (i, segment) in segments.iter().enumerate() {
        match step(current, path, segment)? {
            Some(next) => current = next,
            None if i + 1 == segments.len() => return Ok(None),
            None => return Err(missing_intermediate(path, segment)),
        }
    }
    Ok(Some(current.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_single_segment() {
        let path = AttributePath::parse("name").unwrap();
        assert_eq!(path.len(), 1);
        assert_eq!(path.first(), "name");
        assert_eq!(path.as_str(), "name");
    }

    #[test]
    fn test_parse_rejects_empty_segments() {
        for raw in ["", ".", "a.", ".a", "a..b"] {
            let result = AttributePath::parse(raw);
            assert!(
                matches!(result, Err(ResourceError::ImproperlyConfigured { .. })),
                "expected '{raw}' to be rejected"
            );
        }
    }

    #[test]
    fn test_walk_value_objects_and_arrays() {
        let value = json!({"address": {"city": "Oslo"}, "tags": ["a", "b"]});

        assert_eq!(
            walk_value(&value, "p", &["address", "city"]).unwrap(),
            Some(json!("Oslo"))
        );
        assert_eq!(
            walk_value(&value, "p", &["tags", "1"]).unwrap(),
            Some(json!("b"))
        );
    }

    #[test]
    fn test_walk_value_missing_leaf_is_none() {
        let value = json!({"address": {"city": "Oslo"}, "tags": ["a"]});

        assert_eq!(walk_value(&value, "p", &["address", "zip"]).unwrap(), None);
        assert_eq!(walk_value(&value, "p", &["tags", "5"]).unwrap(), None);
    }

    #[test]
    fn test_walk_value_missing_intermediate_is_error() {
        let value = json!({"address": {"city": "Oslo"}});
        let result = walk_value(&value, "p", &["geo", "lat"]);
        assert!(matches!(result, Err(ResourceError::ImproperlyConfigured { .. })));
    }

    #[test]
    fn test_walk_value_through_scalar_or_null_is_error() {
        let value = json!({"name": "Ada", "manager": null});

        assert!(walk_value(&value, "p", &["name", "first"]).is_err());
        assert!(walk_value(&value, "p", &["manager", "name"]).is_err());
    }

    #[test]
    fn test_walk_value_non_numeric_array_index_is_error() {
        let value = json!({"tags": ["a"]});
        let result = walk_value(&value, "tags.first", &["tags", "first"]);
        assert!(matches!(result, Err(ResourceError::ImproperlyConfigured { .. })));
    }

    #[test]
    fn test_walk_value_empty_segments_returns_value() {
        let value = json!({"a": 1});
        assert_eq!(walk_value(&value, "a", &[]).unwrap(), Some(value.clone()));
    }
}
