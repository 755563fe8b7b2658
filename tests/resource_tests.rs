//! Integration tests for resources, relations, caching and request
//! coalescing.
//!
//! These tests drive [`RestClient`] through an in-memory transport that
//! serves canned JSON per route and records every request it receives.

use async_trait::async_trait;
use parking_lot::Mutex;
use rest_resource::clients::{
    HttpError, HttpMethod, HttpRequest, HttpResponse, HttpResponseError, HttpTransport,
};
use rest_resource::rest::{
    Attribute, CacheMaxAge, RequestOptions, ResourceClass, ResourceError, RestClient, SaveOptions,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

/// Serves canned responses keyed by path and query.
#[derive(Debug, Default)]
struct FakeTransport {
    routes: Mutex<HashMap<String, HttpResponse>>,
    failures: Mutex<HashMap<String, u16>>,
    requests: Mutex<Vec<HttpRequest>>,
    delay: Option<Duration>,
    next_id: AtomicU64,
}

impl FakeTransport {
    fn new() -> Self {
        Self::default()
    }

    fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    fn route(&self, path: &str, body: Value) {
        self.route_response(path, HttpResponse::ok(body));
    }

    fn route_response(&self, path: &str, response: HttpResponse) {
        self.routes.lock().insert(path.to_string(), response);
    }

    fn fail(&self, path: &str, code: u16) {
        self.failures.lock().insert(path.to_string(), code);
    }

    fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    fn hits(&self, path: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|request| request.path_and_query() == path)
            .count()
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        self.requests.lock().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let key = request.path_and_query();
        let failure = self.failures.lock().get(&key).copied();
        if let Some(code) = failure {
            return Err(HttpError::Response(HttpResponseError {
                code,
                method: request.http_method,
                path: key,
                message: "request failed".to_string(),
                body: json!({"errors": {"title": ["is required"]}}),
                error_reference: None,
            }));
        }

        match request.http_method {
            HttpMethod::Post => {
                let mut body = request.body.and_then(|b| b.as_object().cloned()).unwrap_or_default();
                let id = 100 + self.next_id.fetch_add(1, Ordering::SeqCst);
                body.insert("id".to_string(), json!(id));
                Ok(HttpResponse::new(201, HashMap::new(), Value::Object(body)))
            }
            HttpMethod::Patch => Ok(HttpResponse::ok(request.body.unwrap_or(Value::Null))),
            HttpMethod::Delete => Ok(HttpResponse::new(204, HashMap::new(), Value::Null)),
            _ => {
                let response = self.routes.lock().get(&key).cloned();
                response.ok_or_else(|| {
                    HttpError::Response(HttpResponseError {
                        code: 404,
                        method: request.http_method,
                        path: key,
                        message: "not found".to_string(),
                        body: json!({"detail": "Not found."}),
                        error_reference: None,
                    })
                })
            }
        }
    }
}

fn users() -> Arc<ResourceClass> {
    ResourceClass::builder("User", "/users")
        .related("groups", "Group")
        .build()
        .unwrap()
}

fn groups() -> Arc<ResourceClass> {
    ResourceClass::builder("Group", "/groups")
        .related("users", "User")
        .build()
        .unwrap()
}

fn todos() -> Arc<ResourceClass> {
    ResourceClass::builder("Todo", "/todos")
        .related("user", "User")
        .related("watchers", "User")
        .build()
        .unwrap()
}

/// A transport seeded with a small graph: todos point at users, users and
/// groups point at each other.
fn seeded() -> FakeTransport {
    let transport = FakeTransport::new();
    seed(&transport);
    transport
}

fn seed(transport: &FakeTransport) {
    transport.route("/users/1", json!({"id": 1, "name": "Ada", "groups": [1]}));
    transport.route("/users/2", json!({"id": 2, "name": "Grace", "groups": [1]}));
    transport.route("/groups/1", json!({"id": 1, "name": "Admins", "users": [1, 2]}));
    transport.route(
        "/todos/1",
        json!({"id": 1, "title": "Write docs", "user": 1, "watchers": [], "meta": {"tags": ["a"]}}),
    );
    transport.route(
        "/todos/2",
        json!({"id": 2, "title": "Review", "user": 1, "watchers": [1, 2]}),
    );
    transport.route("/todos/3", json!({"id": 3, "title": "Orphan", "user": null}));
}

fn client_for(transport: &Arc<FakeTransport>) -> RestClient {
    let client = RestClient::with_transport(transport.clone());
    client.register(&users());
    client.register(&groups());
    client.register(&todos());
    client
}

// ============================================================================
// Identity cache
// ============================================================================

#[tokio::test]
async fn test_detail_returns_same_handle_from_cache() {
    let transport = Arc::new(seeded());
    let client = client_for(&transport);
    let users = users();

    let first = assert_ok!(users.detail(&client, "1", RequestOptions::new()).await);
    let second = assert_ok!(users.detail(&client, "1", RequestOptions::new()).await);

    assert!(first.ptr_eq(&second));
    assert_eq!(transport.hits("/users/1"), 1);
    assert_eq!(client.request_count("/users/1"), 1);
    assert_eq!(first.get_value("name").unwrap(), Some(json!("Ada")));
}

#[tokio::test]
async fn test_bypassing_cache_refetches_and_replaces_entry() {
    let transport = Arc::new(seeded());
    let client = client_for(&transport);
    let users = users();

    let first = assert_ok!(users.detail(&client, "1", RequestOptions::new()).await);
    let fresh = assert_ok!(
        users
            .detail(&client, "1", RequestOptions::new().use_cache(false))
            .await
    );

    assert!(!first.ptr_eq(&fresh));
    assert_eq!(transport.hits("/users/1"), 2);
    assert!(users.get_cached(&client, "1").unwrap().ptr_eq(&fresh));
}

#[tokio::test]
async fn test_never_max_age_misses_but_still_writes() {
    let transport = Arc::new(seeded());
    let client = client_for(&transport);
    let base = users();
    let uncached = base.extend().cache_max_age(CacheMaxAge::Never).build().unwrap();

    let a = assert_ok!(uncached.detail(&client, "1", RequestOptions::new()).await);
    let b = assert_ok!(uncached.detail(&client, "1", RequestOptions::new()).await);
    assert!(!a.ptr_eq(&b));
    assert_eq!(transport.hits("/users/1"), 2);

    // Same namespace: the base class reuses the last fetch
    let c = assert_ok!(base.detail(&client, "1", RequestOptions::new()).await);
    assert!(c.ptr_eq(&b));
    assert_eq!(transport.hits("/users/1"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_max_age_expires_with_clock() {
    let transport = Arc::new(seeded());
    let client = client_for(&transport);
    let users = users()
        .extend()
        .cache_max_age(CacheMaxAge::For(Duration::from_secs(30)))
        .build()
        .unwrap();

    let first = assert_ok!(users.detail(&client, "1", RequestOptions::new()).await);

    tokio::time::advance(Duration::from_secs(10)).await;
    let cached = assert_ok!(users.detail(&client, "1", RequestOptions::new()).await);
    assert!(cached.ptr_eq(&first));
    assert_eq!(transport.hits("/users/1"), 1);

    tokio::time::advance(Duration::from_secs(25)).await;
    let refreshed = assert_ok!(users.detail(&client, "1", RequestOptions::new()).await);
    assert!(!refreshed.ptr_eq(&first));
    assert_eq!(transport.hits("/users/1"), 2);
}

#[tokio::test]
async fn test_clear_cache_by_class() {
    let transport = Arc::new(seeded());
    let client = client_for(&transport);

    assert_ok!(users().detail(&client, "1", RequestOptions::new()).await);
    assert_ok!(todos().detail(&client, "3", RequestOptions::new()).await);

    users().clear_cache(&client);
    assert!(client.get_cached(&users(), "1").is_none());
    assert!(client.get_cached(&todos(), "3").is_some());

    client.clear_cache(None);
    assert!(client.cache().is_empty());
}

// ============================================================================
// Request coalescing
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_concurrent_details_share_one_request() {
    let transport = Arc::new(FakeTransport::with_delay(Duration::from_millis(50)));
    seed(&transport);
    let client = client_for(&transport);
    let users = users();

    let (a, b) = tokio::join!(
        users.detail(&client, "1", RequestOptions::new()),
        users.detail(&client, "1", RequestOptions::new().use_cache(false)),
    );

    let a = assert_ok!(a);
    let b = assert_ok!(b);
    assert!(a.ptr_eq(&b));
    assert_eq!(transport.hits("/users/1"), 1);
    assert_eq!(client.request_count("/users/1"), 1);

    // Settled requests are forgotten
    assert_ok!(
        users
            .detail(&client, "1", RequestOptions::new().use_cache(false))
            .await
    );
    assert_eq!(transport.hits("/users/1"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_failures_share_one_error() {
    let transport = Arc::new(FakeTransport::with_delay(Duration::from_millis(50)));
    transport.fail("/users/9", 500);
    let reported = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&reported);
    let client = RestClient::with_transport(transport.clone()).with_error_hook(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    let users = users();

    let (a, b) = tokio::join!(
        users.detail(&client, "9", RequestOptions::new()),
        users.detail(&client, "9", RequestOptions::new()),
    );

    assert_eq!(assert_err!(a).status(), Some(500));
    assert_eq!(assert_err!(b).status(), Some(500));
    assert_eq!(transport.hits("/users/9"), 1);
    assert_eq!(reported.load(Ordering::SeqCst), 1);
    assert!(client.get_cached(&users, "9").is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_details_never_duplicate_a_request() {
    let transport = Arc::new(seeded());
    let client = Arc::new(client_for(&transport));

    for round in 1..=20 {
        client.clear_cache(None);
        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let client = Arc::clone(&client);
                tokio::spawn(async move { users().detail(&client, "1", RequestOptions::new()).await })
            })
            .collect();
        for task in tasks {
            assert_ok!(task.await.unwrap());
        }
        assert_eq!(transport.hits("/users/1"), round);
    }
}

// ============================================================================
// Relations
// ============================================================================

#[tokio::test]
async fn test_resolve_related_shares_cached_identity() {
    let transport = Arc::new(seeded());
    let client = client_for(&transport);

    let todo = assert_ok!(
        todos()
            .detail(&client, "1", RequestOptions::new().resolve_related())
            .await
    );
    let user = assert_ok!(users().detail(&client, "1", RequestOptions::new()).await);

    assert_eq!(todo.get_value("user.name").unwrap(), Some(json!("Ada")));
    let related = todo.manager("user").unwrap().unwrap().resource().unwrap();
    assert!(related.ptr_eq(&user));
    assert_eq!(transport.hits("/users/1"), 1);
}

#[tokio::test]
async fn test_sync_get_requires_resolution_and_get_async_resolves() {
    let transport = Arc::new(seeded());
    let client = client_for(&transport);

    let todo = assert_ok!(todos().detail(&client, "1", RequestOptions::new()).await);

    let error = assert_err!(todo.get(Some("user.name")));
    assert!(matches!(error, ResourceError::RelatedNotResolved { .. }));

    let name = assert_ok!(todo.get_async(Some("user.name"), &client).await);
    assert_eq!(name.map(Attribute::into_value), Some(json!("Ada")));

    // Now resolved, the sync read works
    assert_eq!(todo.get_value("user.name").unwrap(), Some(json!("Ada")));
}

#[tokio::test]
async fn test_paths_through_relations() {
    let transport = Arc::new(seeded());
    let client = client_for(&transport);
    let todo = assert_ok!(todos().detail(&client, "2", RequestOptions::new()).await);

    let missing = assert_ok!(todo.get_async(Some("user.propDoesNotExist"), &client).await);
    assert!(missing.is_none());

    let error = assert_err!(todo.get_async(Some("user.nested.propDoesNotExist"), &client).await);
    assert!(error.is_improperly_configured());

    let second = assert_ok!(todo.get_async(Some("watchers.1.name"), &client).await);
    assert_eq!(second.map(Attribute::into_value), Some(json!("Grace")));

    let out_of_range = assert_ok!(todo.get_async(Some("watchers.5"), &client).await);
    assert!(out_of_range.is_none());
}

#[tokio::test]
async fn test_empty_and_null_relations() {
    let transport = Arc::new(seeded());
    let client = client_for(&transport);

    let todo = assert_ok!(todos().detail(&client, "1", RequestOptions::new()).await);
    let watchers = todo.manager("watchers").unwrap().unwrap();
    assert!(watchers.is_resolved());
    assert!(watchers.resources().is_empty());

    let orphan = assert_ok!(
        todos()
            .detail(&client, "3", RequestOptions::new().resolve_related())
            .await
    );
    assert!(orphan.manager("user").unwrap().is_none());
    assert_eq!(orphan.get_value("user").unwrap(), Some(Value::Null));

    // Only the todos themselves were fetched
    assert_eq!(transport.requests().len(), 2);
}

#[tokio::test]
async fn test_deep_resolution_terminates_on_cycles() {
    let transport = Arc::new(seeded());
    let client = client_for(&transport);

    let group = assert_ok!(
        groups()
            .detail(&client, "1", RequestOptions::new().resolve_related_deep())
            .await
    );

    let members = group.manager("users").unwrap().unwrap().resources();
    assert_eq!(members.len(), 2);
    for member in &members {
        let back = member.manager("groups").unwrap().unwrap().resources();
        assert!(back[0].ptr_eq(&group));
    }

    assert_eq!(transport.hits("/groups/1"), 1);
    assert_eq!(transport.hits("/users/1"), 1);
    assert_eq!(transport.hits("/users/2"), 1);
}

#[tokio::test]
async fn test_related_resources_are_freed_after_cache_clear() {
    let transport = Arc::new(seeded());
    let client = client_for(&transport);

    let group = assert_ok!(
        groups()
            .detail(&client, "1", RequestOptions::new().resolve_related_deep())
            .await
    );
    let members = group.manager("users").unwrap().unwrap();
    let back = members.resources()[0].manager("groups").unwrap().unwrap();
    assert!(members.is_resolved());
    assert!(back.owner().is_some());

    client.clear_cache(None);

    // The group is still held here; its members were owned by the cache
    assert!(back.owner().is_none());
    assert!(!members.is_resolved());
    assert!(matches!(
        group.get(Some("users.0.name")),
        Err(ResourceError::RelatedNotResolved { .. })
    ));

    let name = assert_ok!(group.get_async(Some("users.0.name"), &client).await);
    assert_eq!(name.map(Attribute::into_value), Some(json!("Ada")));
    assert_eq!(transport.hits("/users/1"), 2);

    client.clear_cache(None);
    drop(group);
    assert!(members.owner().is_none());
}

#[tokio::test]
async fn test_unregistered_target_is_improperly_configured() {
    let transport = Arc::new(seeded());
    let client = RestClient::with_transport(transport.clone());

    let todo = assert_ok!(todos().detail(&client, "1", RequestOptions::new()).await);
    let error = assert_err!(todo.get_related(&client, false).await);

    assert!(error.is_improperly_configured());
    assert!(!todo.manager("user").unwrap().unwrap().is_resolved());
}

// ============================================================================
// Lists and pagination
// ============================================================================

#[tokio::test]
async fn test_list_caches_rows_and_converges_relations() {
    let transport = Arc::new(seeded());
    transport.route(
        "/todos",
        json!([
            {"id": 1, "title": "Write docs", "user": 1},
            {"id": 2, "title": "Review", "user": 1}
        ]),
    );
    let client = client_for(&transport);
    let todos = todos();

    let page = assert_ok!(
        todos
            .list(&client, RequestOptions::new().resolve_related())
            .await
    );

    assert_eq!(page.len(), 2);
    assert!(todos.get_cached(&client, "1").unwrap().ptr_eq(&page[0]));

    let first = page[0].manager("user").unwrap().unwrap().resource().unwrap();
    let second = page[1].manager("user").unwrap().unwrap().resource().unwrap();
    assert!(first.ptr_eq(&second));
    assert_eq!(transport.hits("/users/1"), 1);

    // Lists always hit the transport
    assert_ok!(todos.list(&client, RequestOptions::new()).await);
    assert_eq!(transport.hits("/todos"), 2);
}

#[tokio::test]
async fn test_list_pagination_walks_pages() {
    let transport = Arc::new(FakeTransport::new());
    let total = HashMap::from([("X-Total-Count".to_string(), vec!["3".to_string()])]);
    transport.route_response(
        "/todos?page=1&page_size=2",
        HttpResponse::new(200, total.clone(), json!([{"id": 1}, {"id": 2}])),
    );
    transport.route_response(
        "/todos?page=2&page_size=2",
        HttpResponse::new(200, total, json!([{"id": 3}])),
    );
    let client = client_for(&transport);
    let todos = todos();

    let first = assert_ok!(
        todos
            .list(&client, RequestOptions::new().page(1).page_size(2))
            .await
    );
    assert_eq!(first.count(), Some(3));
    assert_eq!(first.pages(), Some(2));
    assert!(first.has_next());
    assert!(!first.has_previous());

    let second = assert_ok!(first.next(&client).await).unwrap();
    assert_eq!(second.len(), 1);
    assert!(!second.has_next());
    assert!(second.has_previous());
    assert!(assert_ok!(second.next(&client).await).is_none());

    let back = assert_ok!(second.previous(&client).await).unwrap();
    assert_eq!(back[0].id().as_deref(), Some("1"));
}

#[tokio::test]
async fn test_next_past_the_largest_page_is_none() {
    let transport = Arc::new(FakeTransport::new());
    let last = HashMap::from([(
        "Link".to_string(),
        vec![r#"<http://localhost/todos?page=0>; rel="next""#.to_string()],
    )]);
    transport.route_response(
        &format!("/todos?page={}", u64::MAX),
        HttpResponse::new(200, last, json!([{"id": 1}])),
    );
    let client = client_for(&transport);

    let page = assert_ok!(
        todos()
            .list(&client, RequestOptions::new().page(u64::MAX))
            .await
    );
    assert!(page.has_next());
    assert!(assert_ok!(page.next(&client).await).is_none());
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn test_list_envelope_and_custom_page_params() {
    let transport = Arc::new(FakeTransport::new());
    transport.route(
        "/todos?offset_page=2",
        json!({"count": 5, "next": null, "previous": "/todos?offset_page=1", "results": [{"id": 5}]}),
    );
    let client =
        RestClient::with_transport(transport.clone()).with_page_params("offset_page", "limit");

    let page = assert_ok!(todos().list(&client, RequestOptions::new().page(2)).await);

    assert_eq!(page.count(), Some(5));
    assert!(!page.has_next());
    assert!(page.has_previous());
}

#[tokio::test]
async fn test_list_failure_goes_through_error_hook() {
    let transport = Arc::new(FakeTransport::new());
    transport.fail("/todos", 500);
    let reported = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&reported);
    let client = RestClient::with_transport(transport.clone())
        .with_error_hook(move |e| sink.lock().push(e.status()));

    let error = assert_err!(todos().list(&client, RequestOptions::new()).await);

    assert_eq!(error.status(), Some(500));
    assert_eq!(*reported.lock(), vec![Some(500)]);
}

// ============================================================================
// Saving and deleting
// ============================================================================

#[tokio::test]
async fn test_save_creates_and_caches() {
    let transport = Arc::new(FakeTransport::new());
    let client = client_for(&transport);
    let todos = todos();

    let draft = todos.new_resource(json!({"title": "Ship it"}));
    let response = assert_ok!(draft.save(&client, SaveOptions::new()).await);

    assert_eq!(response.status(), 201);
    assert_eq!(draft.id().as_deref(), Some("100"));
    assert!(!draft.is_dirty());
    assert!(todos.get_cached(&client, "100").unwrap().ptr_eq(&draft));

    let sent = &transport.requests()[0];
    assert_eq!(sent.http_method, HttpMethod::Post);
    assert_eq!(sent.path, "/todos");
    assert_eq!(sent.body, Some(json!({"title": "Ship it"})));
}

#[tokio::test]
async fn test_save_sends_only_whitelisted_changes() {
    let transport = Arc::new(seeded());
    let client = client_for(&transport);
    let todos = todos().extend().fields(["title"]).build().unwrap();

    let todo = assert_ok!(todos.detail(&client, "1", RequestOptions::new()).await);
    todo.set("title", json!("Write better docs"));
    todo.set("secret", json!("hidden"));

    assert_ok!(todo.save(&client, SaveOptions::new()).await);

    let sent = transport.requests().pop().unwrap();
    assert_eq!(sent.http_method, HttpMethod::Patch);
    assert_eq!(sent.path, "/todos/1");
    assert_eq!(sent.body, Some(json!({"title": "Write better docs"})));

    assert_eq!(todo.changes().len(), 1);
    assert_eq!(todo.changes().get("secret"), Some(&json!("hidden")));
    assert_eq!(todo.committed().get("title"), Some(&json!("Write better docs")));
}

#[tokio::test]
async fn test_save_options_override_class_whitelist() {
    let transport = Arc::new(seeded());
    let client = client_for(&transport);

    let todo = assert_ok!(todos().detail(&client, "1", RequestOptions::new()).await);
    todo.set("title", json!("t"));
    todo.set("done", json!(true));

    assert_ok!(todo.save(&client, SaveOptions::new().fields(["done"])).await);

    let sent = transport.requests().pop().unwrap();
    assert_eq!(sent.body, Some(json!({"done": true})));
    assert_eq!(todo.changes().get("title"), Some(&json!("t")));
}

#[tokio::test(start_paused = true)]
async fn test_change_made_during_save_stays_pending() {
    let transport = Arc::new(FakeTransport::with_delay(Duration::from_millis(50)));
    seed(&transport);
    let client = client_for(&transport);

    let todo = assert_ok!(todos().detail(&client, "1", RequestOptions::new()).await);
    todo.set("title", json!("v1"));

    let (saved, ()) = tokio::join!(
        todo.save(&client, SaveOptions::new().fields(["title"])),
        async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            todo.set("title", json!("v2"));
        },
    );
    assert_ok!(saved);

    let sent = transport.requests().pop().unwrap();
    assert_eq!(sent.body, Some(json!({"title": "v1"})));
    assert_eq!(todo.committed().get("title"), Some(&json!("v1")));
    assert_eq!(todo.changes().get("title"), Some(&json!("v2")));
    assert_eq!(todo.get_value("title").unwrap(), Some(json!("v2")));
}

#[tokio::test]
async fn test_failed_save_keeps_pending_changes() {
    let transport = Arc::new(seeded());
    let client = client_for(&transport).with_error_hook(|_| {});

    let todo = assert_ok!(todos().detail(&client, "1", RequestOptions::new()).await);
    transport.fail("/todos/1", 400);
    todo.set("title", json!(""));

    let error = assert_err!(todo.save(&client, SaveOptions::new()).await);

    assert_eq!(error.status(), Some(400));
    assert_eq!(
        error.field_errors().get("title"),
        Some(&vec!["is required".to_string()])
    );
    assert!(todo.is_dirty());
    assert_eq!(todo.changes().get("title"), Some(&json!("")));
}

#[tokio::test]
async fn test_delete_keeps_cache_entry() {
    let transport = Arc::new(seeded());
    let client = client_for(&transport);

    let todo = assert_ok!(todos().detail(&client, "1", RequestOptions::new()).await);
    let response = assert_ok!(todo.delete(&client).await);

    assert_eq!(response.code, 204);
    assert_eq!(transport.requests().pop().unwrap().http_method, HttpMethod::Delete);
    assert!(client.get_cached(&todos(), "1").is_some());
}

#[tokio::test]
async fn test_delete_unsaved_resource_is_rejected() {
    let transport = Arc::new(FakeTransport::new());
    let client = client_for(&transport);

    let draft = todos().new_resource(json!({"title": "x"}));
    let error = assert_err!(draft.delete(&client).await);

    assert!(error.is_improperly_configured());
    assert!(transport.requests().is_empty());
}
