//! Default HTTP transport backed by reqwest.
//!
//! This module provides the [`HttpClient`] type, an [`HttpTransport`] that
//! joins request paths onto a configured base URL, sends JSON and parses JSON
//! responses.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};

use crate::auth::BearerToken;
use crate::clients::errors::{HttpError, HttpResponseError, InvalidHttpRequestError};
use crate::clients::http_request::{HttpMethod, HttpRequest};
use crate::clients::http_response::HttpResponse;
use crate::clients::transport::HttpTransport;
use crate::config::{BaseUrl, ClientConfig};

/// Library version from Cargo.toml.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Body keys copied into the error message of a failed response.
const ERROR_KEYS: [&str; 6] = [
    "detail",
    "error",
    "error_description",
    "errors",
    "message",
    "non_field_errors",
];

/// HTTP client for a REST API.
///
/// The client handles:
/// - URL construction from the configured base URL
/// - Default headers including User-Agent and Accept
/// - `Authorization: Bearer` injection while the token is valid
/// - Mapping non-2xx responses to [`HttpError::Response`]
///
/// Requests are never retried.
///
/// # Thread Safety
///
/// `HttpClient` is `Send + Sync`, making it safe to share across async tasks.
///
/// # Example
///
/// ```rust,ignore
/// use rest_resource::{BaseUrl, ClientConfig};
/// use rest_resource::clients::{HttpClient, HttpTransport};
///
/// let config = ClientConfig::builder()
///     .base_url(BaseUrl::new("https://api.example.com")?)
///     .build()?;
/// let client = HttpClient::new(&config)?;
///
/// let response = client.get("/users/1").await?;
/// println!("{}", response.body);
/// ```
#[derive(Debug)]
pub struct HttpClient {
    client: reqwest::Client,
    base_url: BaseUrl,
    default_headers: BTreeMap<String, String>,
    bearer_token: Option<BearerToken>,
}

// Verify HttpClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<HttpClient>();
};

impl HttpClient {
    /// Creates a new HTTP client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Network`] if the underlying reqwest client cannot
    /// be created (e.g., TLS initialization failure).
    pub fn new(config: &ClientConfig) -> Result<Self, HttpError> {
        let user_agent_prefix = config
            .user_agent_prefix()
            .map_or(String::new(), |prefix| format!("{prefix} | "));
        let rust_version = env!("CARGO_PKG_RUST_VERSION");
        let user_agent =
            format!("{user_agent_prefix}rest-resource v{SDK_VERSION} | Rust {rust_version}");

        let mut default_headers = BTreeMap::new();
        default_headers.insert("User-Agent".to_string(), user_agent);
        default_headers.insert("Accept".to_string(), "application/json".to_string());
        for (name, value) in config.default_headers() {
            default_headers.insert(name.clone(), value.clone());
        }

        let client = reqwest::Client::builder().use_rustls_tls().build()?;

        Ok(Self {
            client,
            base_url: config.base_url().clone(),
            default_headers,
            bearer_token: config.bearer_token().cloned(),
        })
    }

    /// Returns the base URL for this client.
    #[must_use]
    pub const fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    /// Returns the default headers for this client.
    #[must_use]
    pub const fn default_headers(&self) -> &BTreeMap<String, String> {
        &self.default_headers
    }

    /// Returns the `Authorization` header value to send, if any.
    fn authorization(&self) -> Option<String> {
        let token = self.bearer_token.as_ref()?;
        if token.is_valid() {
            Some(format!("Bearer {}", token.as_ref()))
        } else {
            tracing::warn!("bearer token has expired; sending request without Authorization");
            None
        }
    }

    fn build_request(&self, request: &HttpRequest) -> Result<reqwest::RequestBuilder, HttpError> {
        let url = self.base_url.join(&request.path);
        let method = match request.http_method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Head => reqwest::Method::HEAD,
            HttpMethod::Options => reqwest::Method::OPTIONS,
        };

        let mut headers = self.default_headers.clone();
        if let Some(authorization) = self.authorization() {
            headers.insert("Authorization".to_string(), authorization);
        }
        if request.body.is_some() {
            headers.insert("Content-Type".to_string(), "application/json".to_string());
        }
        for (key, value) in &request.extra_headers {
            headers.insert(key.clone(), value.clone());
        }

        let mut header_map = reqwest::header::HeaderMap::new();
        for (key, value) in &headers {
            let invalid = || InvalidHttpRequestError::InvalidHeader { name: key.clone() };
            let name = reqwest::header::HeaderName::from_bytes(key.as_bytes())
                .map_err(|_| invalid())?;
            let value = reqwest::header::HeaderValue::from_str(value).map_err(|_| invalid())?;
            header_map.insert(name, value);
        }

        let mut builder = self.client.request(method, url).headers(header_map);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.to_string());
        }
        Ok(builder)
    }

    /// Parses response headers into a `HashMap`.
    fn parse_response_headers(
        headers: &reqwest::header::HeaderMap,
    ) -> HashMap<String, Vec<String>> {
        let mut result: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in headers {
            let key = name.as_str().to_lowercase();
            let value = value.to_str().unwrap_or_default().to_string();
            result.entry(key).or_default().push(value);
        }
        result
    }

    /// Parses a response body. Empty bodies are `Null`; non-JSON bodies are
    /// wrapped as `{"raw_body": text}`.
    fn parse_body(text: &str) -> serde_json::Value {
        if text.trim().is_empty() {
            return serde_json::Value::Null;
        }
        serde_json::from_str(text).unwrap_or_else(|_| serde_json::json!({ "raw_body": text }))
    }

    /// Serializes the error-bearing parts of a failed response.
    fn serialize_error(response: &HttpResponse) -> String {
        let mut error_body = serde_json::Map::new();

        if let Some(body) = response.body.as_object() {
            for key in ERROR_KEYS {
                if let Some(value) = body.get(key) {
                    error_body.insert(key.to_string(), value.clone());
                }
            }
        }

        if error_body.is_empty() {
            if response.body.is_null() {
                error_body.insert(
                    "error".to_string(),
                    serde_json::json!(reqwest::StatusCode::from_u16(response.code)
                        .ok()
                        .and_then(|status| status.canonical_reason())
                        .unwrap_or("Unknown status")),
                );
            } else {
                error_body.insert("body".to_string(), response.body.clone());
            }
        }

        if let Some(request_id) = response.request_id() {
            error_body.insert(
                "error_reference".to_string(),
                serde_json::json!(format!(
                    "If you report this error, please include this id: {request_id}."
                )),
            );
        }

        serde_json::to_string(&error_body).unwrap_or_else(|_| "{}".to_string())
    }
}

#[async_trait]
impl HttpTransport for HttpClient {
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        request.verify()?;

        tracing::debug!(
            method = %request.http_method,
            path = %request.path_and_query(),
            "sending request"
        );

        let res = self.build_request(&request)?.send().await?;

        let code = res.status().as_u16();
        let headers = Self::parse_response_headers(res.headers());
        let body_text = res.text().await?;
        let response = HttpResponse::new(code, headers, Self::parse_body(&body_text));

        if response.is_ok() {
            return Ok(response);
        }

        Err(HttpError::Response(HttpResponseError {
            code,
            method: request.http_method,
            path: request.path,
            message: Self::serialize_error(&response),
            error_reference: response.request_id().map(String::from),
            body: response.body,
        }))
    }
}
