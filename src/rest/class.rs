//! Resource class descriptors.
//!
//! A [`ResourceClass`] declares how one kind of remote resource is modeled:
//! its cache namespace, collection endpoint, save whitelist, relations and
//! cache max age. Descriptors are immutable and shared as
//! `Arc<ResourceClass>`; [`ResourceClass::extend`] derives a new descriptor
//! without touching the base.
//!
//! # Example
//!
//! ```rust
//! use rest_resource::rest::{CacheMaxAge, ResourceClass};
//! use std::time::Duration;
//!
//! let todos = ResourceClass::builder("Todo", "/todos")
//!     .related("user", "User")
//!     .fields(["title", "completed"])
//!     .cache_max_age(CacheMaxAge::For(Duration::from_secs(60)))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(todos.detail_route_path("3"), "/todos/3");
//! assert_eq!(todos.related_target("user"), Some("User"));
//!
//! // Extending keeps the namespace unless renamed
//! let uncached = todos.extend().cache_max_age(CacheMaxAge::Never).build().unwrap();
//! assert_eq!(uncached.name(), "Todo");
//! assert_eq!(todos.cache_max_age(), CacheMaxAge::For(Duration::from_secs(60)));
//! ```

use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::Endpoint;
use crate::error::ConfigError;
use crate::rest::{
    CacheKey, CacheMaxAge, DefaultRelatedManager, RelatedManagerPolicy, RequestOptions, Resource,
    ResourceError, ResourceResponse, RestClient,
};

/// Default primary key attribute.
pub const DEFAULT_PK_FIELD: &str = "id";

/// An immutable descriptor for one kind of remote resource.
#[derive(Debug)]
pub struct ResourceClass {
    name: String,
    endpoint: Endpoint,
    fields: Option<Vec<String>>,
    related: BTreeMap<String, String>,
    cache_max_age: CacheMaxAge,
    pk_field: String,
    related_manager: Arc<dyn RelatedManagerPolicy>,
}

// Verify ResourceClass is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ResourceClass>();
};

impl ResourceClass {
    /// Starts declaring a class with its cache namespace and endpoint.
    #[must_use]
    pub fn builder(name: impl Into<String>, endpoint: impl Into<String>) -> ResourceClassBuilder {
        ResourceClassBuilder {
            name: name.into(),
            endpoint: endpoint.into(),
            fields: None,
            related: BTreeMap::new(),
            cache_max_age: CacheMaxAge::default(),
            pk_field: DEFAULT_PK_FIELD.to_string(),
            related_manager: None,
        }
    }

    /// Returns a builder seeded from this class.
    ///
    /// The result keeps this class's name, and so shares its cache
    /// namespace, unless [`ResourceClassBuilder::name`] overrides it.
    #[must_use]
    pub fn extend(&self) -> ResourceClassBuilder {
        ResourceClassBuilder {
            name: self.name.clone(),
            endpoint: self.endpoint.to_string(),
            fields: self.fields.clone(),
            related: self.related.clone(),
            cache_max_age: self.cache_max_age,
            pk_field: self.pk_field.clone(),
            related_manager: Some(Arc::clone(&self.related_manager)),
        }
    }

    /// Returns the class name, which is also the cache namespace.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the collection endpoint.
    #[must_use]
    pub const fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Returns the save whitelist, if declared.
    #[must_use]
    pub fn fields(&self) -> Option<&[String]> {
        self.fields.as_deref()
    }

    /// Returns the declared relations as `field -> target class name`.
    #[must_use]
    pub const fn related(&self) -> &BTreeMap<String, String> {
        &self.related
    }

    /// Returns the target class name of a declared relation.
    #[must_use]
    pub fn related_target(&self, field: &str) -> Option<&str> {
        self.related.get(field).map(String::as_str)
    }

    /// Returns `true` if `field` is a declared relation.
    #[must_use]
    pub fn is_related(&self, field: &str) -> bool {
        self.related.contains_key(field)
    }

    /// Returns how long fetched resources stay fresh.
    #[must_use]
    pub const fn cache_max_age(&self) -> CacheMaxAge {
        self.cache_max_age
    }

    /// Returns the primary key attribute.
    #[must_use]
    pub fn pk_field(&self) -> &str {
        &self.pk_field
    }

    /// Returns the policy that turns related values into ids.
    #[must_use]
    pub fn related_manager(&self) -> &dyn RelatedManagerPolicy {
        self.related_manager.as_ref()
    }

    /// Returns the route path for one resource: `"{endpoint}/{id}"`.
    #[must_use]
    pub fn detail_route_path(&self, id: &str) -> String {
        self.endpoint.detail_path(id)
    }

    /// Returns the cache key for an id of this class.
    #[must_use]
    pub fn cache_key(&self, id: impl Into<String>) -> CacheKey {
        CacheKey::new(self.name.clone(), id)
    }

    /// Reads the primary key out of a JSON object as a string.
    ///
    /// Strings and numbers are accepted; anything else yields `None`.
    #[must_use]
    pub fn extract_pk(&self, attributes: &serde_json::Map<String, Value>) -> Option<String> {
        match attributes.get(&self.pk_field)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Creates an unsaved local resource. All attributes start pending.
    ///
    /// Non-object values produce a resource with no attributes.
    #[must_use]
    pub fn new_resource(self: &Arc<Self>, attributes: Value) -> Resource {
        let attributes = match attributes {
            Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        Resource::new(self, attributes)
    }

    /// Fetches one resource through `client`. See [`RestClient::detail`].
    ///
    /// # Errors
    ///
    /// Propagates any error from the detail call.
    pub async fn detail(
        self: &Arc<Self>,
        client: &RestClient,
        id: &str,
        options: RequestOptions,
    ) -> Result<Resource, ResourceError> {
        client.detail(self, id, options).await
    }

    /// Lists resources through `client`. See [`RestClient::list`].
    ///
    /// # Errors
    ///
    /// Propagates any error from the list call.
    pub async fn list(
        self: &Arc<Self>,
        client: &RestClient,
        options: RequestOptions,
    ) -> Result<ResourceResponse<Vec<Resource>>, ResourceError> {
        client.list(self, options).await
    }

    /// Returns the cached resource for `id`, if fresh.
    #[must_use]
    pub fn get_cached(self: &Arc<Self>, client: &RestClient, id: &str) -> Option<Resource> {
        client.get_cached(self, id)
    }

    /// Drops every cached resource of this class.
    pub fn clear_cache(&self, client: &RestClient) {
        client.clear_cache(Some(self));
    }
}

/// Builder for [`ResourceClass`].
#[derive(Debug)]
pub struct ResourceClassBuilder {
    name: String,
    endpoint: String,
    fields: Option<Vec<String>>,
    related: BTreeMap<String, String>,
    cache_max_age: CacheMaxAge,
    pk_field: String,
    related_manager: Option<Arc<dyn RelatedManagerPolicy>>,
}

impl ResourceClassBuilder {
    /// Renames the class, giving it its own cache namespace.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Replaces the collection endpoint.
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the save whitelist.
    #[must_use]
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Declares a relation from `field` to the class named `target`.
    #[must_use]
    pub fn related(mut self, field: impl Into<String>, target: impl Into<String>) -> Self {
        self.related.insert(field.into(), target.into());
        self
    }

    /// Sets how long fetched resources stay fresh.
    #[must_use]
    pub const fn cache_max_age(mut self, max_age: CacheMaxAge) -> Self {
        self.cache_max_age = max_age;
        self
    }

    /// Sets the primary key attribute (default `"id"`).
    #[must_use]
    pub fn pk_field(mut self, field: impl Into<String>) -> Self {
        self.pk_field = field.into();
        self
    }

    /// Replaces the policy that turns related values into ids.
    #[must_use]
    pub fn related_manager(mut self, policy: Arc<dyn RelatedManagerPolicy>) -> Self {
        self.related_manager = Some(policy);
        self
    }

    /// Builds the descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyClassName`] for an empty name,
    /// [`ConfigError::InvalidEndpoint`] for an unusable endpoint, and
    /// [`ConfigError::MissingRequiredField`] for an empty primary key.
    pub fn build(self) -> Result<Arc<ResourceClass>, ConfigError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(ConfigError::EmptyClassName);
        }
        let endpoint = Endpoint::new(self.endpoint)?;
        if self.pk_field.trim().is_empty() {
            return Err(ConfigError::MissingRequiredField { field: "pk_field" });
        }

        Ok(Arc::new(ResourceClass {
            name,
            endpoint,
            fields: self.fields,
            related: self.related,
            cache_max_age: self.cache_max_age,
            pk_field: self.pk_field,
            related_manager: self
                .related_manager
                .unwrap_or_else(|| Arc::new(DefaultRelatedManager::default())),
        }))
    }
}
