//! Relation handling between resources.
//!
//! A [`RelatedManager`] is created lazily the first time a declared related
//! field with a non-null value is read. It remembers the referenced ids and,
//! once resolved, the resources they point to. Resolution goes through
//! [`RestClient`], so it shares the identity cache and in-flight requests
//! with direct `detail` calls: resolving `(User, 1)` through a relation and
//! fetching it directly yield the same handle.
//!
//! Deep resolution walks the graph depth-first. Each pass carries a set of
//! visited cache keys; a resource is descended into at most once per pass,
//! so cyclic graphs terminate.

use futures::future::{try_join_all, BoxFuture};
use futures::FutureExt;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Weak};

use crate::rest::resource::ResourceInner;
use crate::rest::{CacheKey, Resource, ResourceError, RestClient};

/// Cache keys already descended into during one deep-resolution pass.
pub(crate) type VisitedSet = Mutex<HashSet<CacheKey>>;

/// The ids a related field refers to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RelatedIds {
    /// A to-one relation.
    One(String),
    /// A to-many relation, in declaration order. May be empty.
    Many(Vec<String>),
}

impl RelatedIds {
    /// Returns the ids as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        match self {
            Self::One(id) => std::slice::from_ref(id),
            Self::Many(ids) => ids,
        }
    }
}

/// Turns raw related values into ids.
///
/// Each [`ResourceClass`](crate::rest::ResourceClass) carries one policy;
/// replace it to support payload shapes the default does not understand.
pub trait RelatedManagerPolicy: Send + Sync + fmt::Debug {
    /// Extracts one id from a related value.
    ///
    /// Returns `Ok(None)` for `null`.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::ImproperlyConfigured`] if no id can be read.
    fn extract_id(&self, value: &Value) -> Result<Option<String>, ResourceError>;

    /// Reads the ids of a related field. Arrays are to-many, anything else
    /// is to-one. `null` yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::ImproperlyConfigured`] if an element has no id.
    fn related_ids(&self, field: &str, value: &Value) -> Result<Option<RelatedIds>, ResourceError> {
        let required = |value: &Value| {
            self.extract_id(value)?.ok_or_else(|| {
                ResourceError::improperly_configured(format!(
                    "related field '{field}' holds a value without an id: {value}"
                ))
            })
        };

        match value {
            Value::Null => Ok(None),
            Value::Array(items) => items
                .iter()
                .map(required)
                .collect::<Result<Vec<_>, _>>()
                .map(|ids| Some(RelatedIds::Many(ids))),
            other => required(other).map(|id| Some(RelatedIds::One(id))),
        }
    }
}

/// The default policy: accepts strings, numbers, and objects carrying the
/// primary key.
#[derive(Clone, Debug)]
pub struct DefaultRelatedManager {
    pk_field: String,
}

impl DefaultRelatedManager {
    /// Creates a policy reading nested objects' ids from `pk_field`.
    #[must_use]
    pub fn new(pk_field: impl Into<String>) -> Self {
        Self {
            pk_field: pk_field.into(),
        }
    }
}

impl Default for DefaultRelatedManager {
    fn default() -> Self {
        Self::new(crate::rest::class::DEFAULT_PK_FIELD)
    }
}

impl RelatedManagerPolicy for DefaultRelatedManager {
    fn extract_id(&self, value: &Value) -> Result<Option<String>, ResourceError> {
        match value {
            Value::Null => Ok(None),
            Value::String(s) if !s.is_empty() => Ok(Some(s.clone())),
            Value::Number(n) => Ok(Some(n.to_string())),
            Value::Object(map) => match map.get(&self.pk_field) {
                Some(Value::String(s)) if !s.is_empty() => Ok(Some(s.clone())),
                Some(Value::Number(n)) => Ok(Some(n.to_string())),
                _ => Err(ResourceError::improperly_configured(format!(
                    "related object has no usable '{}' field",
                    self.pk_field
                ))),
            },
            other => Err(ResourceError::improperly_configured(format!(
                "cannot read a related id from {other}"
            ))),
        }
    }
}

/// Resolution progress of a [`RelatedManager`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResolveState {
    /// Nothing fetched yet.
    Unresolved,
    /// A resolution is running.
    Resolving,
    /// The target resources are available.
    Resolved,
}

enum ManagerState {
    Unresolved,
    Resolving,
    // Targets are held weakly; the identity cache owns them. A target that
    // has been dropped turns the relation back to unresolved.
    Resolved(Vec<Weak<ResourceInner>>),
}

struct ManagerInner {
    owner: Weak<ResourceInner>,
    field: String,
    target: String,
    ids: RelatedIds,
    state: Mutex<ManagerState>,
}

/// The relation object behind one related field of one resource.
///
/// `RelatedManager` is a cheap clone handle. Equality is identity.
#[derive(Clone)]
pub struct RelatedManager {
    inner: Arc<ManagerInner>,
}

impl RelatedManager {
    pub(crate) fn new(
        owner: Weak<ResourceInner>,
        field: impl Into<String>,
        target: impl Into<String>,
        ids: RelatedIds,
    ) -> Self {
        // Nothing to fetch for an empty to-many relation
        let state = match &ids {
            RelatedIds::Many(ids) if ids.is_empty() => ManagerState::Resolved(Vec::new()),
            _ => ManagerState::Unresolved,
        };
        Self {
            inner: Arc::new(ManagerInner {
                owner,
                field: field.into(),
                target: target.into(),
                ids,
                state: Mutex::new(state),
            }),
        }
    }

    /// Returns the resource owning this relation, if it is still alive.
    #[must_use]
    pub fn owner(&self) -> Option<Resource> {
        self.inner.owner.upgrade().map(Resource::from_inner)
    }

    /// Returns the related field name.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.inner.field
    }

    /// Returns the target class name.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.inner.target
    }

    /// Returns the referenced ids.
    #[must_use]
    pub fn ids(&self) -> &RelatedIds {
        &self.inner.ids
    }

    /// Returns `true` for a to-many relation.
    #[must_use]
    pub fn is_many(&self) -> bool {
        matches!(self.inner.ids, RelatedIds::Many(_))
    }

    /// Returns the number of referenced ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.ids.as_slice().len()
    }

    /// Returns `true` if no ids are referenced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the resolution state.
    #[must_use]
    pub fn state(&self) -> ResolveState {
        match &*self.inner.state.lock() {
            ManagerState::Unresolved => ResolveState::Unresolved,
            ManagerState::Resolving => ResolveState::Resolving,
            ManagerState::Resolved(targets) if targets.iter().all(|t| t.strong_count() > 0) => {
                ResolveState::Resolved
            }
            ManagerState::Resolved(_) => ResolveState::Unresolved,
        }
    }

    /// Returns `true` once the target resources are available.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.state() == ResolveState::Resolved
    }

    /// Returns the resolved resources in id order, or an empty list when
    /// unresolved.
    ///
    /// Targets are owned by the identity cache. Once one is evicted and
    /// dropped the relation reads as unresolved again.
    #[must_use]
    pub fn resources(&self) -> Vec<Resource> {
        self.resolved().unwrap_or_default()
    }

    /// Returns the resolved resource of a to-one relation.
    #[must_use]
    pub fn resource(&self) -> Option<Resource> {
        if self.is_many() {
            return None;
        }
        self.resolved().and_then(|resources| resources.into_iter().next())
    }

    /// Forgets the resolved resources. The next resolve fetches again
    /// (subject to the cache).
    pub fn invalidate(&self) {
        let mut state = self.inner.state.lock();
        if !matches!(&self.inner.ids, RelatedIds::Many(ids) if ids.is_empty()) {
            *state = ManagerState::Unresolved;
        }
    }

    /// Returns the resolved targets, or `None` if unresolved or any target
    /// has since been dropped.
    pub(crate) fn resolved(&self) -> Option<Vec<Resource>> {
        let mut state = self.inner.state.lock();
        let ManagerState::Resolved(targets) = &*state else {
            return None;
        };
        let resources: Option<Vec<Resource>> = targets
            .iter()
            .map(|target| target.upgrade().map(Resource::from_inner))
            .collect();
        if resources.is_none() {
            *state = ManagerState::Unresolved;
        }
        resources
    }

    pub(crate) fn not_resolved(&self) -> ResourceError {
        ResourceError::RelatedNotResolved {
            resource: self
                .owner()
                .map_or_else(String::new, |owner| owner.class().name().to_string()),
            field: self.inner.field.clone(),
        }
    }

    /// Fetches the target resources, then with `deep` resolves their
    /// relations recursively.
    ///
    /// Resolving an already resolved manager issues no request; `deep` still
    /// descends into the children.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::ImproperlyConfigured`] if the target class is
    /// not registered with `client`, or any error from fetching. On error the
    /// manager returns to [`ResolveState::Unresolved`].
    pub async fn resolve(
        &self,
        client: &RestClient,
        deep: bool,
    ) -> Result<Vec<Resource>, ResourceError> {
        let visited = VisitedSet::default();
        if let Some(key) = self.owner().and_then(|owner| owner.cache_key()) {
            visited.lock().insert(key);
        }
        self.resolve_with(client, deep, &visited).await
    }

    pub(crate) fn resolve_with<'a>(
        &'a self,
        client: &'a RestClient,
        deep: bool,
        visited: &'a VisitedSet,
    ) -> BoxFuture<'a, Result<Vec<Resource>, ResourceError>> {
        async move {
            let resources = match self.resolved() {
                Some(resources) => resources,
                None => self.fetch(client).await?,
            };

            if deep {
                let children: Vec<Resource> = {
                    let mut seen = visited.lock();
                    resources
                        .iter()
                        .filter(|child| child.cache_key().map_or(true, |key| seen.insert(key)))
                        .cloned()
                        .collect()
                };
                try_join_all(
                    children
                        .iter()
                        .map(|child| child.resolve_related_with(client, true, visited)),
                )
                .await?;
            }

            Ok(resources)
        }
        .boxed()
    }

    async fn fetch(&self, client: &RestClient) -> Result<Vec<Resource>, ResourceError> {
        *self.inner.state.lock() = ManagerState::Resolving;

        let result = match client.class(&self.inner.target) {
            Ok(class) => {
                tracing::debug!(
                    field = %self.inner.field,
                    target = %self.inner.target,
                    count = self.len(),
                    "resolving relation"
                );
                try_join_all(
                    self.inner
                        .ids
                        .as_slice()
                        .iter()
                        .map(|id| client.fetch_detail(&class, id, true, None)),
                )
                .await
            }
            Err(e) => Err(e),
        };

        let mut state = self.inner.state.lock();
        match result {
            Ok(resources) => {
                let targets = resources.iter().map(Resource::downgrade).collect();
                *state = ManagerState::Resolved(targets);
                Ok(resources)
            }
            Err(e) => {
                *state = ManagerState::Unresolved;
                Err(e)
            }
        }
    }
}

impl PartialEq for RelatedManager {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for RelatedManager {}

impl fmt::Debug for RelatedManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelatedManager")
            .field("field", &self.inner.field)
            .field("target", &self.inner.target)
            .field("ids", &self.inner.ids)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_policy_extracts_ids() {
        let policy = DefaultRelatedManager::default();

        assert_eq!(policy.extract_id(&json!(3)).unwrap(), Some("3".to_string()));
        assert_eq!(policy.extract_id(&json!("u1")).unwrap(), Some("u1".to_string()));
        assert_eq!(
            policy.extract_id(&json!({"id": 9, "name": "x"})).unwrap(),
            Some("9".to_string())
        );
        assert_eq!(policy.extract_id(&json!(null)).unwrap(), None);
        assert!(policy.extract_id(&json!(true)).is_err());
        assert!(policy.extract_id(&json!({"name": "x"})).is_err());
    }

    #[test]
    fn test_default_policy_related_ids() {
        let policy = DefaultRelatedManager::default();

        assert_eq!(
            policy.related_ids("user", &json!(1)).unwrap(),
            Some(RelatedIds::One("1".to_string()))
        );
        assert_eq!(
            policy.related_ids("users", &json!([1, {"id": 2}])).unwrap(),
            Some(RelatedIds::Many(vec!["1".to_string(), "2".to_string()]))
        );
        assert_eq!(
            policy.related_ids("users", &json!([])).unwrap(),
            Some(RelatedIds::Many(Vec::new()))
        );
        assert_eq!(policy.related_ids("owner", &json!(null)).unwrap(), None);
        assert!(policy.related_ids("users", &json!([1, null])).is_err());
    }

    #[test]
    fn test_custom_pk_policy() {
        let policy = DefaultRelatedManager::new("slug");
        assert_eq!(
            policy.extract_id(&json!({"slug": "abc"})).unwrap(),
            Some("abc".to_string())
        );
    }

    #[test]
    fn test_empty_many_starts_resolved() {
        let manager = RelatedManager::new(Weak::new(), "users", "User", RelatedIds::Many(vec![]));

        assert!(manager.is_many());
        assert!(manager.is_empty());
        assert!(manager.is_resolved());
        assert!(manager.resources().is_empty());

        manager.invalidate();
        assert!(manager.is_resolved());
    }

    #[test]
    fn test_to_one_starts_unresolved() {
        let manager = RelatedManager::new(
            Weak::new(),
            "user",
            "User",
            RelatedIds::One("1".to_string()),
        );

        assert!(!manager.is_many());
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.state(), ResolveState::Unresolved);
        assert!(manager.resource().is_none());
        assert!(manager.owner().is_none());
        assert!(matches!(
            manager.not_resolved(),
            ResourceError::RelatedNotResolved { field, .. } if field == "user"
        ));
    }

    #[test]
    fn test_dropped_target_reads_as_unresolved() {
        let users = crate::rest::ResourceClass::builder("User", "/users").build().unwrap();
        let user = users.new_resource(json!({"id": 1}));
        let manager = RelatedManager::new(Weak::new(), "user", "User", RelatedIds::One("1".into()));
        *manager.inner.state.lock() = ManagerState::Resolved(vec![user.downgrade()]);

        assert!(manager.is_resolved());
        assert!(manager.resource().unwrap().ptr_eq(&user));

        drop(user);
        assert_eq!(manager.state(), ResolveState::Unresolved);
        assert!(manager.resolved().is_none());
        assert!(manager.resources().is_empty());
    }

    #[test]
    fn test_clones_are_equal() {
        let manager = RelatedManager::new(Weak::new(), "user", "User", RelatedIds::One("1".into()));
        let other = RelatedManager::new(Weak::new(), "user", "User", RelatedIds::One("1".into()));
        assert_eq!(manager, manager.clone());
        assert_ne!(manager, other);
    }
}
