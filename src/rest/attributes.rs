//! Change tracking for resource attributes.
//!
//! [`AttributeStore`] keeps two JSON maps per resource:
//!
//! - `committed`: the last state known to the server
//! - `pending`: local mutations that have not been saved yet
//!
//! Reads see `pending` first, then `committed`. A save sends pending values
//! and, once the server accepts them, commits exactly the sent values. Keys
//! that were not sent, or were changed again while the save was in flight,
//! stay pending.
//!
//! # Example
//!
//! ```rust
//! use rest_resource::rest::AttributeStore;
//! use serde_json::json;
//!
//! let mut store = AttributeStore::from_committed(json!({"id": 1, "title": "Old"}).as_object().unwrap().clone());
//! assert!(!store.is_dirty());
//!
//! store.set("title", json!("New"));
//! assert!(store.is_dirty());
//! assert_eq!(store.get(Some("title")).unwrap(), Some(json!("New")));
//! assert_eq!(store.committed().get("title"), Some(&json!("Old")));
//!
//! store.commit(&["title"]);
//! assert!(!store.is_dirty());
//! assert_eq!(store.committed().get("title"), Some(&json!("New")));
//! ```

use serde_json::{Map, Value};

use crate::rest::path::{walk_value, AttributePath};
use crate::rest::ResourceError;

/// Committed and pending attribute maps for one resource.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttributeStore {
    committed: Map<String, Value>,
    pending: Map<String, Value>,
}

impl AttributeStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store for a resource that exists only locally.
    ///
    /// Every attribute is pending, so the first save sends them all.
    #[must_use]
    pub fn from_pending(attributes: Map<String, Value>) -> Self {
        Self {
            committed: Map::new(),
            pending: attributes,
        }
    }

    /// Creates a store for server-provided state. Nothing is pending.
    #[must_use]
    pub fn from_committed(attributes: Map<String, Value>) -> Self {
        Self {
            committed: attributes,
            pending: Map::new(),
        }
    }

    /// Returns the raw top-level value for `key`, pending first.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<&Value> {
        self.pending.get(key).or_else(|| self.committed.get(key))
    }

    /// Reads an attribute.
    ///
    /// With no path, returns the merged object. With a dotted path, walks
    /// nested objects and arrays below the top-level value.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::ImproperlyConfigured`] if the path is
    /// malformed or passes through a missing, `null` or scalar value.
    pub fn get(&self, path: Option<&str>) -> Result<Option<Value>, ResourceError> {
        let Some(path) = path else {
            return Ok(Some(Value::Object(self.attributes())));
        };
        let parsed = AttributePath::parse(path)?;
        let segments = parsed.segments();

        match self.raw(segments[0]) {
            Some(value) => walk_value(value, path, &segments[1..]),
            None if segments.len() == 1 => Ok(None),
            None => Err(crate::rest::path::missing_intermediate(path, segments[0])),
        }
    }

    /// Records a local change. Only `pending` is written.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.pending.insert(key.into(), value);
    }

    /// Moves the listed keys from `pending` into `committed`.
    ///
    /// Keys that are not pending are ignored.
    pub fn commit<S: AsRef<str>>(&mut self, keys: &[S]) {
        for key in keys {
            if let Some(value) = self.pending.remove(key.as_ref()) {
                self.committed.insert(key.as_ref().to_string(), value);
            }
        }
    }

    /// Commits the values a save actually sent.
    ///
    /// Each sent value becomes committed. The pending entry is cleared only
    /// while it still holds the sent value; a key changed again after the
    /// body was built stays pending.
    pub fn commit_sent(&mut self, sent: &Map<String, Value>) {
        for (key, value) in sent {
            if self.pending.get(key) == Some(value) {
                self.pending.remove(key);
            }
            self.committed.insert(key.clone(), value.clone());
        }
    }

    /// Merges server-echoed state into `committed`.
    ///
    /// Pending values are left alone; they still shadow the merged keys.
    pub fn merge_committed(&mut self, attributes: &Map<String, Value>) {
        for (key, value) in attributes {
            self.committed.insert(key.clone(), value.clone());
        }
    }

    /// Drops a pending change without saving it, returning the dropped value.
    pub fn discard(&mut self, key: &str) -> Option<Value> {
        self.pending.remove(key)
    }

    /// Returns the uncommitted changes.
    #[must_use]
    pub const fn changes(&self) -> &Map<String, Value> {
        &self.pending
    }

    /// Returns the last known server state.
    #[must_use]
    pub const fn committed(&self) -> &Map<String, Value> {
        &self.committed
    }

    /// Returns `committed` overlaid with `pending`.
    #[must_use]
    pub fn attributes(&self) -> Map<String, Value> {
        let mut merged = self.committed.clone();
        for (key, value) in &self.pending {
            merged.insert(key.clone(), value.clone());
        }
        merged
    }

    /// Returns `true` if any change is pending.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Returns the pending values for the listed keys, skipping keys that
    /// have no pending change.
    #[must_use]
    pub fn pending_fields<S: AsRef<str>>(&self, keys: &[S]) -> Map<String, Value> {
        keys.iter()
            .filter_map(|key| {
                self.pending
                    .get(key.as_ref())
                    .map(|value| (key.as_ref().to_string(), value.clone()))
            })
            .collect()
    }
}
