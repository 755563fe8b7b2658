//! The request coordinator.
//!
//! [`RestClient`] owns everything shared between resources: the transport,
//! the identity cache, the class registry used to resolve relations, the
//! table of in-flight detail requests and a per-route request counter.
//!
//! # Request coalescing
//!
//! Concurrent `detail` calls for the same route share one transport
//! request. The first caller spawns the request; later callers await the
//! same shared future and receive the same [`Resource`] handle (or a clone
//! of the same error). Once the request settles its entry is removed, so a
//! later cache miss issues a new request.
//!
//! # Example
//!
//! ```rust,ignore
//! use rest_resource::rest::{RequestOptions, ResourceClass, RestClient};
//! use rest_resource::{BaseUrl, ClientConfig};
//!
//! let config = ClientConfig::builder()
//!     .base_url(BaseUrl::new("https://api.example.com")?)
//!     .build()?;
//! let client = RestClient::new(&config)?;
//!
//! let users = ResourceClass::builder("User", "/users").build()?;
//! let todos = ResourceClass::builder("Todo", "/todos").related("user", "User").build()?;
//! client.register(&users);
//!
//! let todo = client.detail(&todos, "1", RequestOptions::new().resolve_related()).await?;
//! let a = client.detail(&todos, "1", RequestOptions::new()).await?;
//! assert!(a.ptr_eq(&todo));
//! ```

use futures::future::{try_join_all, BoxFuture, Shared};
use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::clients::{HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse, HttpTransport};
use crate::config::{ClientConfig, DEFAULT_PAGE_PARAM, DEFAULT_PAGE_SIZE_PARAM};
use crate::rest::related::VisitedSet;
use crate::rest::response::ListRequest;
use crate::rest::{
    CacheKey, CachedResource, Pagination, RequestOptions, Resource, ResourceCache, ResourceClass,
    ResourceError, ResourceResponse, SaveOptions,
};

/// Callback invoked with every failed transport request.
pub type ErrorHook = Arc<dyn Fn(&ResourceError) + Send + Sync>;

type SharedFetch = Shared<BoxFuture<'static, Result<Resource, ResourceError>>>;
type InFlight = Arc<Mutex<HashMap<String, SharedFetch>>>;

/// Coordinates resource requests against one API.
pub struct RestClient {
    transport: Arc<dyn HttpTransport>,
    cache: ResourceCache,
    registry: RwLock<HashMap<String, Arc<ResourceClass>>>,
    in_flight: InFlight,
    request_tracker: Mutex<HashMap<String, u64>>,
    error_hook: Option<ErrorHook>,
    page_param: String,
    page_size_param: String,
}

// Verify RestClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<RestClient>();
};

impl RestClient {
    /// Creates a client backed by [`HttpClient`].
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ResourceError> {
        let transport = HttpClient::new(config)?;
        Ok(Self::with_transport(Arc::new(transport))
            .with_page_params(config.page_param(), config.page_size_param()))
    }

    /// Creates a client over any transport, with a fresh cache.
    #[must_use]
    pub fn with_transport(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            cache: ResourceCache::new(),
            registry: RwLock::new(HashMap::new()),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            request_tracker: Mutex::new(HashMap::new()),
            error_hook: None,
            page_param: DEFAULT_PAGE_PARAM.to_string(),
            page_size_param: DEFAULT_PAGE_SIZE_PARAM.to_string(),
        }
    }

    /// Uses `cache` instead of a private one. Clients sharing a cache share
    /// resource identity.
    #[must_use]
    pub fn with_cache(mut self, cache: ResourceCache) -> Self {
        self.cache = cache;
        self
    }

    /// Installs a callback for failed requests. Without one, failures are
    /// logged at warn level.
    #[must_use]
    pub fn with_error_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ResourceError) + Send + Sync + 'static,
    {
        self.error_hook = Some(Arc::new(hook));
        self
    }

    /// Sets the query parameter names used for pagination.
    #[must_use]
    pub fn with_page_params(mut self, page: impl Into<String>, page_size: impl Into<String>) -> Self {
        self.page_param = page.into();
        self.page_size_param = page_size.into();
        self
    }

    /// Returns the transport.
    #[must_use]
    pub fn transport(&self) -> &Arc<dyn HttpTransport> {
        &self.transport
    }

    /// Returns the identity cache.
    #[must_use]
    pub const fn cache(&self) -> &ResourceCache {
        &self.cache
    }

    /// Registers a class so relations can target it by name.
    ///
    /// Classes passed to `detail`, `list` or `save` are registered on first
    /// use; an explicit registration replaces an earlier one.
    pub fn register(&self, class: &Arc<ResourceClass>) {
        self.registry
            .write()
            .insert(class.name().to_string(), Arc::clone(class));
    }

    fn remember(&self, class: &Arc<ResourceClass>) {
        self.registry
            .write()
            .entry(class.name().to_string())
            .or_insert_with(|| Arc::clone(class));
    }

    /// Looks up a registered class.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::ImproperlyConfigured`] if no class of that
    /// name is known.
    pub fn class(&self, name: &str) -> Result<Arc<ResourceClass>, ResourceError> {
        self.registry.read().get(name).cloned().ok_or_else(|| {
            ResourceError::improperly_configured(format!(
                "no resource class named '{name}' is registered"
            ))
        })
    }

    /// Returns how many requests were issued per route path.
    #[must_use]
    pub fn request_tracker(&self) -> HashMap<String, u64> {
        self.request_tracker.lock().clone()
    }

    /// Returns how many requests were issued for one route path.
    #[must_use]
    pub fn request_count(&self, route: &str) -> u64 {
        self.request_tracker.lock().get(route).copied().unwrap_or(0)
    }

    fn track(&self, route: &str) {
        *self
            .request_tracker
            .lock()
            .entry(route.to_string())
            .or_insert(0) += 1;
    }

    fn report(&self, error: ResourceError) -> ResourceError {
        report(self.error_hook.as_ref(), &error);
        error
    }

    /// Returns the fresh cached resource for `id`, if any.
    #[must_use]
    pub fn get_cached(&self, class: &Arc<ResourceClass>, id: &str) -> Option<Resource> {
        self.cache.get(&class.cache_key(id), class.cache_max_age())
    }

    /// Returns the raw cache entry for `id`, fresh or not.
    #[must_use]
    pub fn cached_entry(&self, class: &ResourceClass, id: &str) -> Option<CachedResource> {
        self.cache.entry(&class.cache_key(id))
    }

    /// Drops cached resources of one class, or all of them.
    pub fn clear_cache(&self, class: Option<&ResourceClass>) {
        self.cache.clear(class.map(ResourceClass::name));
    }

    /// Fetches one resource.
    ///
    /// A fresh cache entry is returned without a request unless the cache is
    /// bypassed. Concurrent calls for the same route share one request.
    /// With `resolve_related` the declared relations are resolved before
    /// returning.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Http`] for transport failures,
    /// [`ResourceError::InvalidResponse`] if the body is not an object, and
    /// any error from relation resolution.
    pub async fn detail(
        &self,
        class: &Arc<ResourceClass>,
        id: &str,
        options: RequestOptions,
    ) -> Result<Resource, ResourceError> {
        self.remember(class);
        let resource = self
            .fetch_detail(class, id, options.uses_cache(), Some(options.query()))
            .await?;

        if options.resolves_related() {
            resource
                .get_related(self, options.resolves_related_deep())
                .await?;
        }
        Ok(resource)
    }

    pub(crate) async fn fetch_detail(
        &self,
        class: &Arc<ResourceClass>,
        id: &str,
        use_cache: bool,
        query: Option<&BTreeMap<String, String>>,
    ) -> Result<Resource, ResourceError> {
        let key = class.cache_key(id);
        if use_cache {
            if let Some(hit) = self.cache.get(&key, class.cache_max_age()) {
                tracing::debug!(%key, "cache hit");
                return Ok(hit);
            }
        }

        let route = class.detail_route_path(id);
        let request = HttpRequest::builder(HttpMethod::Get, route.as_str())
            .query(query.cloned().unwrap_or_default())
            .build()
            .map_err(|e| self.report(HttpError::from(e).into()))?;
        let flight_key = request.path_and_query();

        let shared = {
            let mut in_flight = self.in_flight.lock();
            if let Some(existing) = in_flight.get(&flight_key) {
                tracing::debug!(route = %flight_key, "joining in-flight request");
                existing.clone()
            } else {
                // A fetch that finished since the first read has already
                // written the cache before leaving the in-flight table
                if use_cache {
                    if let Some(hit) = self.cache.get(&key, class.cache_max_age()) {
                        tracing::debug!(%key, "cache hit");
                        return Ok(hit);
                    }
                }
                self.track(&route);
                let fetch = DetailFetch {
                    transport: Arc::clone(&self.transport),
                    cache: self.cache.clone(),
                    in_flight: Arc::clone(&self.in_flight),
                    error_hook: self.error_hook.clone(),
                    class: Arc::clone(class),
                    key,
                    flight_key: flight_key.clone(),
                };
                let shared = fetch.run(request).boxed().shared();
                in_flight.insert(flight_key, shared.clone());
                tokio::spawn(shared.clone());
                shared
            }
        };

        shared.await
    }

    /// Lists resources from the class endpoint.
    ///
    /// Always issues a request. Rows carrying an id are written to the
    /// cache. The response carries [`Pagination`] state; see
    /// [`ResourceResponse::next`] and [`ResourceResponse::previous`].
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Http`] for transport failures,
    /// [`ResourceError::InvalidResponse`] for bodies that are not an array,
    /// an envelope or an object, and any error from relation resolution.
    pub async fn list(
        &self,
        class: &Arc<ResourceClass>,
        options: RequestOptions,
    ) -> Result<ResourceResponse<Vec<Resource>>, ResourceError> {
        self.remember(class);
        let route = class.endpoint().to_string();

        let mut builder =
            HttpRequest::builder(HttpMethod::Get, route.as_str()).query(options.query().clone());
        if let Some(page) = options.current_page() {
            builder = builder.query_param(&self.page_param, page.to_string());
        }
        if let Some(page_size) = options.current_page_size() {
            builder = builder.query_param(&self.page_size_param, page_size.to_string());
        }
        let request = builder
            .build()
            .map_err(|e| self.report(HttpError::from(e).into()))?;

        self.track(&route);
        tracing::debug!(route = %request.path_and_query(), "listing resources");
        let response = self
            .transport
            .request(request)
            .await
            .map_err(|e| self.report(e.into()))?;

        let page = parse_list_body(class, &response).map_err(|e| self.report(e))?;
        let rows: Vec<Resource> = page
            .rows
            .into_iter()
            .map(|attributes| {
                let resource = Resource::from_server(class, attributes, None);
                if let Some(key) = resource.cache_key() {
                    self.cache.put(key, resource.clone());
                }
                resource
            })
            .collect();

        if options.resolves_related() {
            let visited = VisitedSet::default();
            visited
                .lock()
                .extend(rows.iter().filter_map(Resource::cache_key));
            try_join_all(rows.iter().map(|row| {
                row.resolve_related_with(self, options.resolves_related_deep(), &visited)
            }))
            .await?;
        }

        let pagination = paginate(&options, &response, &page.envelope, rows.len());
        Ok(ResourceResponse::new(rows, response).with_pagination(
            pagination,
            ListRequest {
                class: Arc::clone(class),
                options,
            },
        ))
    }

    /// Saves a resource's pending changes.
    ///
    /// The body holds the pending values of the whitelisted fields: the
    /// per-call list, else the class `fields`, else every pending field. A
    /// resource without an id is created with POST to the endpoint and then
    /// cached; otherwise PATCH goes to its detail route. On success exactly
    /// the sent fields stop being pending, and the server echo is merged into
    /// the committed state.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Http`] for transport failures. Pending
    /// changes are kept on failure.
    pub async fn save(
        &self,
        resource: &Resource,
        options: SaveOptions,
    ) -> Result<ResourceResponse<Resource>, ResourceError> {
        let class = resource.class();
        self.remember(class);

        let whitelist: Vec<String> = match (options.field_list(), class.fields()) {
            (Some(fields), _) | (None, Some(fields)) => fields.to_vec(),
            (None, None) => resource.changes().keys().cloned().collect(),
        };
        let (body, id) = resource.prepare_save(whitelist.as_slice());

        let (method, route) = match &id {
            Some(id) => (HttpMethod::Patch, class.detail_route_path(id)),
            None => (HttpMethod::Post, class.endpoint().to_string()),
        };
        let request = HttpRequest::builder(method, route.as_str())
            .body(Value::Object(body.clone()))
            .build()
            .map_err(|e| self.report(HttpError::from(e).into()))?;

        self.track(&route);
        tracing::debug!(%method, %route, fields = body.len(), "saving resource");
        let response = self
            .transport
            .request(request)
            .await
            .map_err(|e| self.report(e.into()))?;

        resource.apply_saved(&body, response.body.as_object());
        if id.is_none() {
            if let Some(key) = resource.cache_key() {
                self.cache.put(key, resource.clone());
            }
        }

        Ok(ResourceResponse::new(resource.clone(), response))
    }

    /// Deletes a saved resource. The cache entry is left in place.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::ImproperlyConfigured`] for a resource without
    /// an id and [`ResourceError::Http`] for transport failures.
    pub async fn delete(&self, resource: &Resource) -> Result<HttpResponse, ResourceError> {
        let Some(id) = resource.id() else {
            return Err(ResourceError::improperly_configured(format!(
                "cannot delete an unsaved {}",
                resource.class().name()
            )));
        };
        let route = resource.class().detail_route_path(&id);

        self.track(&route);
        tracing::debug!(%route, "deleting resource");
        self.transport
            .delete(&route)
            .await
            .map_err(|e| self.report(e.into()))
    }
}

impl fmt::Debug for RestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut classes: Vec<String> = self.registry.read().keys().cloned().collect();
        classes.sort();
        f.debug_struct("RestClient")
            .field("transport", &self.transport)
            .field("cache", &self.cache)
            .field("classes", &classes)
            .field("error_hook", &self.error_hook.is_some())
            .finish_non_exhaustive()
    }
}

fn report(hook: Option<&ErrorHook>, error: &ResourceError) {
    match hook {
        Some(hook) => hook(error),
        None => tracing::warn!(error = %error, "resource request failed"),
    }
}

/// Everything one spawned detail request needs, owned.
struct DetailFetch {
    transport: Arc<dyn HttpTransport>,
    cache: ResourceCache,
    in_flight: InFlight,
    error_hook: Option<ErrorHook>,
    class: Arc<ResourceClass>,
    key: CacheKey,
    flight_key: String,
}

impl DetailFetch {
    async fn run(self, request: HttpRequest) -> Result<Resource, ResourceError> {
        tracing::debug!(route = %self.flight_key, "fetching resource");
        let result = self.fetch(request).await;

        self.in_flight.lock().remove(&self.flight_key);
        if let Err(e) = &result {
            report(self.error_hook.as_ref(), e);
        }
        result
    }

    async fn fetch(&self, request: HttpRequest) -> Result<Resource, ResourceError> {
        let response = self.transport.request(request).await?;
        let Value::Object(attributes) = response.body else {
            return Err(ResourceError::InvalidResponse {
                resource: self.class.name().to_string(),
                message: format!("expected an object from {}", self.flight_key),
            });
        };

        let resource = Resource::from_server(&self.class, attributes, Some(&self.key.id));
        self.cache.put(self.key.clone(), resource.clone());
        Ok(resource)
    }
}

/// Envelope metadata of a list body.
#[derive(Debug, Default)]
struct Envelope {
    count: Option<u64>,
    next: Option<bool>,
    previous: Option<bool>,
}

struct ListPage {
    rows: Vec<Map<String, Value>>,
    envelope: Envelope,
}

fn parse_list_body(class: &ResourceClass, response: &HttpResponse) -> Result<ListPage, ResourceError> {
    let invalid = |message: String| ResourceError::InvalidResponse {
        resource: class.name().to_string(),
        message,
    };
    let rows_of = |items: &[Value]| {
        items
            .iter()
            .map(|item| match item {
                Value::Object(map) => Ok(map.clone()),
                other => Err(invalid(format!("expected an object row, got {other}"))),
            })
            .collect::<Result<Vec<_>, _>>()
    };

    match &response.body {
        Value::Null => Ok(ListPage {
            rows: Vec::new(),
            envelope: Envelope {
                count: Some(0),
                ..Envelope::default()
            },
        }),
        Value::Array(items) => Ok(ListPage {
            rows: rows_of(items.as_slice())?,
            envelope: Envelope {
                count: response.total_count(),
                ..Envelope::default()
            },
        }),
        Value::Object(map) => match map.get("results") {
            Some(Value::Array(items)) => Ok(ListPage {
                rows: rows_of(items.as_slice())?,
                envelope: Envelope {
                    count: map.get("count").and_then(Value::as_u64),
                    next: Some(map.get("next").is_some_and(|v| !v.is_null())),
                    previous: Some(map.get("previous").is_some_and(|v| !v.is_null())),
                },
            }),
            _ => Ok(ListPage {
                rows: vec![map.clone()],
                envelope: Envelope {
                    count: Some(1),
                    next: Some(false),
                    previous: Some(false),
                },
            }),
        },
        other => Err(invalid(format!("expected a list body, got {other}"))),
    }
}

fn paginate(
    options: &RequestOptions,
    response: &HttpResponse,
    envelope: &Envelope,
    rows: usize,
) -> Pagination {
    let current_page = options.current_page().unwrap_or(1).max(1);
    let per_page = options
        .current_page_size()
        .unwrap_or_else(|| u64::try_from(rows).unwrap_or(u64::MAX));
    let links = response.links();

    let has_next = envelope.next.unwrap_or_else(|| {
        links.next.is_some()
            || envelope.count.is_some_and(|count| {
                per_page > 0
                    && current_page
                        .checked_mul(per_page)
                        .is_some_and(|seen| seen < count)
            })
    });
    let has_previous = envelope
        .previous
        .unwrap_or_else(|| links.previous.is_some() || current_page > 1);

    Pagination::new(envelope.count, current_page, per_page, has_next, has_previous)
}
