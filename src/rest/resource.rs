//! Resource instances.
//!
//! A [`Resource`] is a shared handle to one remote (or not yet saved)
//! object. Clones point at the same state: mutating one clone is visible
//! through every other, and the identity cache hands back these same
//! handles. Equality is identity, as with `Arc::ptr_eq`.
//!
//! Reads go through dotted paths. A path can cross declared relations:
//! `"user.name"` on a todo steps through the `user` relation into the
//! related `User`. The synchronous [`Resource::get`] requires those
//! relations to be resolved already; [`Resource::get_async`] resolves them
//! on the way.
//!
//! # Example
//!
//! ```rust,ignore
//! let todo = todos.detail(&client, "1", RequestOptions::new()).await?;
//!
//! // Fails with RelatedNotResolved until the relation is fetched
//! let name = todo.get_async(Some("user.name"), &client).await?;
//!
//! todo.set("title", json!("Updated"));
//! todo.save(&client, SaveOptions::new()).await?;
//! assert!(!todo.is_dirty());
//! ```

use futures::future::{try_join_all, BoxFuture};
use futures::FutureExt;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use crate::clients::HttpResponse;
use crate::rest::path::{self, missing_intermediate, parse_index, AttributePath};
use crate::rest::related::VisitedSet;
use crate::rest::{
    AttributeStore, CacheKey, RelatedManager, ResourceClass, ResourceError, ResourceResponse,
    RestClient, SaveOptions,
};

struct ResourceState {
    store: AttributeStore,
    id: Option<String>,
    managers: HashMap<String, RelatedManager>,
}

pub(crate) struct ResourceInner {
    class: Arc<ResourceClass>,
    state: Mutex<ResourceState>,
}

/// A shared handle to one resource.
#[derive(Clone)]
pub struct Resource {
    inner: Arc<ResourceInner>,
}

// Verify Resource is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Resource>();
};

/// The value found at an attribute path.
#[derive(Clone, Debug, PartialEq)]
pub enum Attribute {
    /// A plain JSON value.
    Value(Value),
    /// A related field, as its relation object.
    Related(RelatedManager),
    /// A related resource reached by index or through a to-one relation.
    Resource(Resource),
}

impl Attribute {
    /// Returns the JSON value, if this is one.
    #[must_use]
    pub const fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the relation object, if this is one.
    #[must_use]
    pub const fn as_related(&self) -> Option<&RelatedManager> {
        match self {
            Self::Related(manager) => Some(manager),
            _ => None,
        }
    }

    /// Returns the resource, if this is one.
    #[must_use]
    pub const fn as_resource(&self) -> Option<&Resource> {
        match self {
            Self::Resource(resource) => Some(resource),
            _ => None,
        }
    }

    /// Converts into a JSON value. Relations become their raw ids and
    /// resources their attribute object.
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Value(value) => value,
            Self::Related(manager) => match manager.ids() {
                crate::rest::related::RelatedIds::One(id) => Value::String(id.clone()),
                crate::rest::related::RelatedIds::Many(ids) => {
                    Value::Array(ids.iter().cloned().map(Value::String).collect())
                }
            },
            Self::Resource(resource) => Value::Object(resource.attributes()),
        }
    }
}

/// One position while walking a path.
enum Node {
    Resource(Resource),
    Related(RelatedManager),
    Value(Value),
}

enum Step {
    Next(Node),
    Missing,
    Unresolved(RelatedManager),
}

impl Node {
    fn step(&self, path: &str, segment: &str) -> Result<Step, ResourceError> {
        match self {
            Self::Resource(resource) => resource.step(segment),
            Self::Related(manager) => {
                let Some(resources) = manager.resolved() else {
                    return Ok(Step::Unresolved(manager.clone()));
                };
                if manager.is_many() {
                    let index = parse_index(path, segment)?;
                    return Ok(resources
                        .into_iter()
                        .nth(index)
                        .map_or(Step::Missing, |resource| Step::Next(Self::Resource(resource))));
                }
                // To-one relations are transparent
                match resources.into_iter().next() {
                    Some(resource) => resource.step(segment),
                    None => Ok(Step::Unresolved(manager.clone())),
                }
            }
            Self::Value(value) => Ok(path::step(value, path, segment)?
                .map_or(Step::Missing, |next| Step::Next(Self::Value(next.clone())))),
        }
    }

    fn into_attribute(self) -> Attribute {
        match self {
            Self::Resource(resource) => Attribute::Resource(resource),
            Self::Related(manager) => Attribute::Related(manager),
            Self::Value(value) => Attribute::Value(value),
        }
    }
}

impl Resource {
    pub(crate) fn new(class: &Arc<ResourceClass>, attributes: Map<String, Value>) -> Self {
        let id = class.extract_pk(&attributes);
        Self::build(class, AttributeStore::from_pending(attributes), id)
    }

    /// Materializes server state. `fallback_id` is used when the payload
    /// carries no primary key.
    pub(crate) fn from_server(
        class: &Arc<ResourceClass>,
        attributes: Map<String, Value>,
        fallback_id: Option<&str>,
    ) -> Self {
        let id = class
            .extract_pk(&attributes)
            .or_else(|| fallback_id.map(str::to_string));
        Self::build(class, AttributeStore::from_committed(attributes), id)
    }

    fn build(class: &Arc<ResourceClass>, store: AttributeStore, id: Option<String>) -> Self {
        Self {
            inner: Arc::new(ResourceInner {
                class: Arc::clone(class),
                state: Mutex::new(ResourceState {
                    store,
                    id,
                    managers: HashMap::new(),
                }),
            }),
        }
    }

    pub(crate) const fn from_inner(inner: Arc<ResourceInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<ResourceInner> {
        Arc::downgrade(&self.inner)
    }

    /// Returns `true` if both handles point at the same resource.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Returns the class this resource belongs to.
    #[must_use]
    pub fn class(&self) -> &Arc<ResourceClass> {
        &self.inner.class
    }

    /// Returns the primary key, once known.
    #[must_use]
    pub fn id(&self) -> Option<String> {
        self.inner.state.lock().id.clone()
    }

    /// Returns the identity cache key, once the id is known.
    #[must_use]
    pub fn cache_key(&self) -> Option<CacheKey> {
        self.id().map(|id| self.inner.class.cache_key(id))
    }

    /// Returns the pending changes.
    #[must_use]
    pub fn changes(&self) -> Map<String, Value> {
        self.inner.state.lock().store.changes().clone()
    }

    /// Returns the last known server state.
    #[must_use]
    pub fn committed(&self) -> Map<String, Value> {
        self.inner.state.lock().store.committed().clone()
    }

    /// Returns committed state overlaid with pending changes.
    #[must_use]
    pub fn attributes(&self) -> Map<String, Value> {
        self.inner.state.lock().store.attributes()
    }

    /// Returns `true` if any change is pending.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.inner.state.lock().store.is_dirty()
    }

    /// Records a local change.
    ///
    /// Setting a related field drops its relation object; the next read
    /// builds a fresh one from the new value.
    pub fn set(&self, key: impl Into<String>, value: Value) {
        let key = key.into();
        let mut state = self.inner.state.lock();
        if key == self.inner.class.pk_field() {
            if let Some(id) = pk_string(&value) {
                state.id = Some(id);
            }
        }
        state.managers.remove(&key);
        state.store.set(key, value);
    }

    /// Drops an unsaved change, returning the dropped value.
    pub fn discard(&self, key: &str) -> Option<Value> {
        let mut state = self.inner.state.lock();
        let dropped = state.store.discard(key)?;
        if key == self.inner.class.pk_field() {
            state.id = state.store.committed().get(key).and_then(pk_string);
        }
        state.managers.remove(key);
        Some(dropped)
    }

    /// Returns the relation object for a declared related field.
    ///
    /// Returns `Ok(None)` if the field is absent or `null`.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::ImproperlyConfigured`] if `field` is not a
    /// declared relation or its value holds no usable id.
    pub fn manager(&self, field: &str) -> Result<Option<RelatedManager>, ResourceError> {
        let class = &self.inner.class;
        let Some(target) = class.related_target(field) else {
            return Err(ResourceError::improperly_configured(format!(
                "'{field}' is not a related field of {}",
                class.name()
            )));
        };

        let mut state = self.inner.state.lock();
        if let Some(manager) = state.managers.get(field) {
            return Ok(Some(manager.clone()));
        }
        let Some(raw) = state.store.raw(field) else {
            return Ok(None);
        };
        let Some(ids) = class.related_manager().related_ids(field, raw)? else {
            return Ok(None);
        };

        let manager = RelatedManager::new(self.downgrade(), field, target, ids);
        state.managers.insert(field.to_string(), manager.clone());
        Ok(Some(manager))
    }

    fn managers(&self) -> Result<Vec<RelatedManager>, ResourceError> {
        self.inner
            .class
            .related()
            .keys()
            .filter_map(|field| self.manager(field).transpose())
            .collect()
    }

    fn step(&self, segment: &str) -> Result<Step, ResourceError> {
        if self.inner.class.is_related(segment) {
            return Ok(match self.manager(segment)? {
                Some(manager) => Step::Next(Node::Related(manager)),
                None => match self.inner.state.lock().store.raw(segment) {
                    Some(value) => Step::Next(Node::Value(value.clone())),
                    None => Step::Missing,
                },
            });
        }

        Ok(self
            .inner
            .state
            .lock()
            .store
            .raw(segment)
            .map_or(Step::Missing, |value| Step::Next(Node::Value(value.clone()))))
    }

    /// Reads an attribute by dotted path, or the whole attribute object
    /// when `path` is `None`.
    ///
    /// A missing leaf is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::RelatedNotResolved`] if the path crosses a
    /// relation that has not been resolved, and
    /// [`ResourceError::ImproperlyConfigured`] if it passes through a
    /// missing, `null` or scalar intermediate value.
    pub fn get(&self, path: Option<&str>) -> Result<Option<Attribute>, ResourceError> {
        let Some(path) = path else {
            return Ok(Some(Attribute::Value(Value::Object(self.attributes()))));
        };
        let parsed = AttributePath::parse(path)?;
        let segments = parsed.segments();

        let mut node = Node::Resource(self.clone());
        for (i, segment) in segments.iter().enumerate() {
            match node.step(path, segment)? {
                Step::Next(next) => node = next,
                Step::Missing if i + 1 == segments.len() => return Ok(None),
                Step::Missing => return Err(missing_intermediate(path, segment)),
                Step::Unresolved(manager) => return Err(manager.not_resolved()),
            }
        }
        Ok(Some(node.into_attribute()))
    }

    /// Like [`Resource::get`], but resolves relations crossed by the path.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::ImproperlyConfigured`] for bad paths and any
    /// error from resolving a relation.
    pub async fn get_async(
        &self,
        path: Option<&str>,
        client: &RestClient,
    ) -> Result<Option<Attribute>, ResourceError> {
        let Some(path) = path else {
            return Ok(Some(Attribute::Value(Value::Object(self.attributes()))));
        };
        let parsed = AttributePath::parse(path)?;
        let segments = parsed.segments();

        let mut node = Node::Resource(self.clone());
        // Keeps freshly resolved targets alive until the walk has stepped into them
        #[allow(clippy::collection_is_never_read)]
        let mut held = Vec::new();
        for (i, segment) in segments.iter().enumerate() {
            let step = loop {
                match node.step(path, segment)? {
                    Step::Unresolved(manager) => {
                        held.extend(manager.resolve(client, false).await?);
                    }
                    step => break step,
                }
            };
            match step {
                Step::Next(next) => node = next,
                Step::Missing if i + 1 == segments.len() => return Ok(None),
                Step::Missing => return Err(missing_intermediate(path, segment)),
                Step::Unresolved(manager) => return Err(manager.not_resolved()),
            }
        }
        Ok(Some(node.into_attribute()))
    }

    /// Convenience for reading a plain JSON value.
    ///
    /// # Errors
    ///
    /// See [`Resource::get`].
    pub fn get_value(&self, path: &str) -> Result<Option<Value>, ResourceError> {
        Ok(self.get(Some(path))?.map(Attribute::into_value))
    }

    /// Resolves every declared relation, recursively with `deep`.
    ///
    /// Deep resolution visits each resource at most once, so cyclic graphs
    /// terminate.
    ///
    /// # Errors
    ///
    /// Returns the first error from any relation.
    pub async fn get_related(&self, client: &RestClient, deep: bool) -> Result<(), ResourceError> {
        let visited = VisitedSet::default();
        if let Some(key) = self.cache_key() {
            visited.lock().insert(key);
        }
        self.resolve_related_with(client, deep, &visited).await
    }

    pub(crate) fn resolve_related_with<'a>(
        &'a self,
        client: &'a RestClient,
        deep: bool,
        visited: &'a VisitedSet,
    ) -> BoxFuture<'a, Result<(), ResourceError>> {
        async move {
            let managers = self.managers()?;
            try_join_all(
                managers
                    .iter()
                    .map(|manager| manager.resolve_with(client, deep, visited)),
            )
            .await?;
            Ok(())
        }
        .boxed()
    }

    /// Saves pending changes. See [`RestClient::save`].
    ///
    /// # Errors
    ///
    /// Propagates any error from the save call.
    pub async fn save(
        &self,
        client: &RestClient,
        options: SaveOptions,
    ) -> Result<ResourceResponse<Self>, ResourceError> {
        client.save(self, options).await
    }

    /// Deletes the remote resource. See [`RestClient::delete`].
    ///
    /// # Errors
    ///
    /// Propagates any error from the delete call.
    pub async fn delete(&self, client: &RestClient) -> Result<HttpResponse, ResourceError> {
        client.delete(self).await
    }

    /// Collects the body for a save: pending values of whitelisted keys.
    pub(crate) fn prepare_save<S: AsRef<str>>(
        &self,
        whitelist: &[S],
    ) -> (Map<String, Value>, Option<String>) {
        let state = self.inner.state.lock();
        (state.store.pending_fields(whitelist), state.id.clone())
    }

    /// Applies an accepted save: commits the sent keys, merges the echoed
    /// object and picks up a server-assigned id.
    pub(crate) fn apply_saved(&self, sent: &Map<String, Value>, echoed: Option<&Map<String, Value>>) {
        let mut state = self.inner.state.lock();
        state.store.commit_sent(sent);

        if let Some(echoed) = echoed {
            state.store.merge_committed(echoed);
            for key in echoed.keys() {
                state.managers.remove(key);
            }
            if state.id.is_none() {
                state.id = self.inner.class.extract_pk(echoed);
            }
        }
    }
}

fn pk_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Resource {}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Resource")
            .field("class", &self.inner.class.name())
            .field("id", &state.id)
            .field("committed", state.store.committed())
            .field("pending", state.store.changes())
            .finish()
    }
}
