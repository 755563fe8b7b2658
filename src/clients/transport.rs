//! The transport contract.
//!
//! Everything above this module talks to the network through
//! [`HttpTransport`]. The crate ships a reqwest-backed implementation
//! ([`HttpClient`](crate::clients::HttpClient)); tests and embedders can plug
//! in their own.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;

use crate::clients::errors::HttpError;
use crate::clients::http_request::{HttpMethod, HttpRequest};
use crate::clients::http_response::HttpResponse;

/// Issues HTTP requests and returns `{status, headers, body}`.
///
/// Implementations must map non-2xx statuses to
/// [`HttpError::Response`](crate::clients::HttpError::Response) and must not
/// retry. Only [`request`](Self::request) is required; the per-method helpers
/// are provided.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use rest_resource::clients::{HttpError, HttpRequest, HttpResponse, HttpTransport};
/// use serde_json::json;
///
/// #[derive(Debug)]
/// struct Echo;
///
/// #[async_trait]
/// impl HttpTransport for Echo {
///     async fn request(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
///         Ok(HttpResponse::ok(json!({ "path": request.path })))
///     }
/// }
/// ```
#[async_trait]
pub trait HttpTransport: Send + Sync + Debug {
    /// Sends a request.
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse, HttpError>;

    /// Sends a GET request.
    async fn get(&self, path: &str) -> Result<HttpResponse, HttpError> {
        self.request(HttpRequest::builder(HttpMethod::Get, path).build()?)
            .await
    }

    /// Sends a POST request with a JSON body.
    async fn post(&self, path: &str, body: Value) -> Result<HttpResponse, HttpError> {
        self.request(HttpRequest::builder(HttpMethod::Post, path).body(body).build()?)
            .await
    }

    /// Sends a PUT request with a JSON body.
    async fn put(&self, path: &str, body: Value) -> Result<HttpResponse, HttpError> {
        self.request(HttpRequest::builder(HttpMethod::Put, path).body(body).build()?)
            .await
    }

    /// Sends a PATCH request with a JSON body.
    async fn patch(&self, path: &str, body: Value) -> Result<HttpResponse, HttpError> {
        self.request(HttpRequest::builder(HttpMethod::Patch, path).body(body).build()?)
            .await
    }

    /// Sends a DELETE request.
    async fn delete(&self, path: &str) -> Result<HttpResponse, HttpError> {
        self.request(HttpRequest::builder(HttpMethod::Delete, path).build()?)
            .await
    }

    /// Sends a HEAD request.
    async fn head(&self, path: &str) -> Result<HttpResponse, HttpError> {
        self.request(HttpRequest::builder(HttpMethod::Head, path).build()?)
            .await
    }

    /// Sends an OPTIONS request.
    async fn options(&self, path: &str) -> Result<HttpResponse, HttpError> {
        self.request(HttpRequest::builder(HttpMethod::Options, path).build()?)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;

    #[derive(Debug, Default)]
    struct Recorder {
        seen: Mutex<Vec<HttpRequest>>,
    }

    #[async_trait]
    impl HttpTransport for Recorder {
        async fn request(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
            self.seen.lock().push(request);
            Ok(HttpResponse::ok(json!({})))
        }
    }

    #[tokio::test]
    async fn test_provided_methods_build_requests() {
        let transport = Recorder::default();
        transport.get("/a").await.unwrap();
        transport.patch("/a/1", json!({"x": 1})).await.unwrap();
        transport.delete("/a/1").await.unwrap();
        transport.head("/a").await.unwrap();
        transport.options("/a").await.unwrap();

        let seen = transport.seen.lock();
        let methods: Vec<_> = seen.iter().map(|r| r.http_method).collect();
        assert_eq!(
            methods,
            vec![
                HttpMethod::Get,
                HttpMethod::Patch,
                HttpMethod::Delete,
                HttpMethod::Head,
                HttpMethod::Options
            ]
        );
        assert_eq!(seen[1].body, Some(json!({"x": 1})));
    }

    #[tokio::test]
    async fn test_transport_is_object_safe() {
        let transport: Box<dyn HttpTransport> = Box::new(Recorder::default());
        let response = transport.post("/a", json!({})).await.unwrap();
        assert!(response.is_ok());
    }
}
