//! HTTP transport layer.
//!
//! # Overview
//!
//! - [`HttpTransport`]: The async transport contract the resource layer calls
//! - [`HttpClient`]: The default reqwest-backed transport
//! - [`HttpRequest`]: A request to be sent to the API
//! - [`HttpResponse`]: A parsed response from the API
//! - [`HttpMethod`]: Supported HTTP methods
//! - [`HttpError`]: Unified error type for transport failures
//!
//! # Example
//!
//! ```rust,ignore
//! use rest_resource::{BaseUrl, ClientConfig};
//! use rest_resource::clients::{HttpClient, HttpMethod, HttpRequest, HttpTransport};
//!
//! let config = ClientConfig::builder()
//!     .base_url(BaseUrl::new("https://api.example.com")?)
//!     .build()?;
//! let client = HttpClient::new(&config)?;
//!
//! let request = HttpRequest::builder(HttpMethod::Get, "/users")
//!     .query_param("page", "2")
//!     .build()?;
//!
//! let response = client.request(request).await?;
//! ```
//!
//! # Retry Behavior
//!
//! Transports never retry. A non-2xx status becomes
//! [`HttpError::Response`] immediately.

mod errors;
mod http_client;
mod http_request;
mod http_response;
mod transport;

pub use errors::{HttpError, HttpResponseError, InvalidHttpRequestError};
pub use http_client::{HttpClient, SDK_VERSION};
pub use http_request::{HttpMethod, HttpRequest, HttpRequestBuilder};
pub use http_response::{HttpResponse, PageLinks};
pub use transport::HttpTransport;
