//! Identity cache for fetched resources.
//!
//! [`ResourceCache`] maps `(class name, id)` to the live [`Resource`] handle
//! last fetched for that key. A cache hit hands back the *same* handle, so
//! every holder observes the same object.
//!
//! Freshness is decided per read with a [`CacheMaxAge`] supplied by the
//! resource class. Entries are stamped with [`tokio::time::Instant`], so
//! tests can drive expiry with a paused clock.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::rest::Resource;

/// How long a cached resource stays fresh.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CacheMaxAge {
    /// Entries never expire.
    #[default]
    Unlimited,
    /// Every read is a miss. Fetched resources are still stored, so switching
    /// back to a longer max age reuses the last fetch.
    Never,
    /// Entries older than the duration are misses.
    For(Duration),
}

impl CacheMaxAge {
    /// Returns `true` if an entry of the given age is still fresh.
    #[must_use]
    pub fn is_fresh(self, age: Duration) -> bool {
        match self {
            Self::Unlimited => true,
            Self::Never => false,
            Self::For(max) => age <= max,
        }
    }
}

/// Cache key: the class name (type id) and the resource id.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    /// The class name used as the cache namespace.
    pub type_id: String,
    /// The resource id, as a string.
    pub id: String,
}

impl CacheKey {
    /// Creates a new cache key.
    #[must_use]
    pub fn new(type_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            type_id: type_id.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.type_id, self.id)
    }
}

#[derive(Clone, Debug)]
struct CacheEntry {
    resource: Resource,
    inserted_at: Instant,
}

/// A raw cache entry, regardless of freshness.
#[derive(Clone, Debug)]
pub struct CachedResource {
    /// The cached resource handle.
    pub resource: Resource,
    /// When the entry was inserted.
    pub inserted_at: Instant,
    /// How long ago the entry was inserted.
    pub age: Duration,
}

/// A shared map from [`CacheKey`] to resource handles.
///
/// `ResourceCache` is a cheap clone handle; clones share the same storage.
///
/// # Example
///
/// ```rust
/// use rest_resource::rest::{CacheKey, CacheMaxAge, ResourceCache};
///
/// let cache = ResourceCache::new();
/// let key = CacheKey::new("User", "1");
/// assert!(cache.get(&key, CacheMaxAge::Unlimited).is_none());
/// assert!(cache.is_empty());
/// ```
#[derive(Clone, Default)]
pub struct ResourceCache {
    entries: Arc<RwLock<HashMap<CacheKey, CacheEntry>>>,
}

impl ResourceCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached resource if present and fresh under `max_age`.
    #[must_use]
    pub fn get(&self, key: &CacheKey, max_age: CacheMaxAge) -> Option<Resource> {
        let entries = self.entries.read();
        let entry = entries.get(key)?;
        if max_age.is_fresh(entry.inserted_at.elapsed()) {
            Some(entry.resource.clone())
        } else {
            tracing::debug!(%key, "cache entry expired");
            None
        }
    }

    /// Returns the raw entry for `key`, fresh or not.
    #[must_use]
    pub fn entry(&self, key: &CacheKey) -> Option<CachedResource> {
        self.entries.read().get(key).map(|entry| CachedResource {
            resource: entry.resource.clone(),
            inserted_at: entry.inserted_at,
            age: entry.inserted_at.elapsed(),
        })
    }

    /// Inserts or replaces the entry for `key`.
    pub fn put(&self, key: CacheKey, resource: Resource) {
        self.entries.write().insert(
            key,
            CacheEntry {
                resource,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Removes one entry.
    pub fn remove(&self, key: &CacheKey) -> Option<Resource> {
        self.entries.write().remove(key).map(|entry| entry.resource)
    }

    /// Drops every entry of one class, or every entry when `type_id` is `None`.
    pub fn clear(&self, type_id: Option<&str>) {
        let mut entries = self.entries.write();
        match type_id {
            Some(type_id) => entries.retain(|key, _| key.type_id != type_id),
            None => entries.clear(),
        }
    }

    /// Returns `true` if an entry exists for `key`, fresh or not.
    #[must_use]
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl fmt::Debug for ResourceCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries.read();
        let mut keys: Vec<_> = entries.keys().collect();
        keys.sort();
        f.debug_struct("ResourceCache").field("keys", &keys).finish()
    }
}

// Verify ResourceCache is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ResourceCache>();
};
