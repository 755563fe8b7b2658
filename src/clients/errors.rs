//! HTTP-specific error types.
//!
//! The client never retries, so a failed request ends in exactly one of:
//!
//! - [`HttpResponseError`]: a non-2xx HTTP response
//! - [`InvalidHttpRequestError`]: a request that failed validation before sending
//! - a network failure reported by the underlying HTTP library
//!
//! [`HttpError`] unifies the three. It is `Clone` so that one failed request
//! can be reported to every caller that was waiting on it.
//!
//! # Example
//!
//! ```rust,ignore
//! use rest_resource::clients::{HttpError, HttpTransport};
//!
//! match transport.get("/users/1").await {
//!     Ok(response) => println!("Success: {}", response.body),
//!     Err(HttpError::Response(e)) => {
//!         println!("API error {}: {}", e.code, e.message);
//!     }
//!     Err(HttpError::InvalidRequest(e)) => println!("Invalid request: {e}"),
//!     Err(HttpError::Network(e)) => println!("Network error: {e}"),
//! }
//! ```

use std::sync::Arc;
use thiserror::Error;

use crate::clients::http_request::HttpMethod;

/// Error returned when an HTTP request receives a non-successful response.
///
/// # Example
///
/// ```rust
/// use rest_resource::clients::{HttpMethod, HttpResponseError};
/// use serde_json::json;
///
/// let error = HttpResponseError {
///     code: 404,
///     method: HttpMethod::Get,
///     path: "/users/9".to_string(),
///     message: r#"{"detail":"Not found."}"#.to_string(),
///     body: json!({"detail": "Not found."}),
///     error_reference: Some("abc-123".to_string()),
/// };
///
/// assert_eq!(error.to_string(), "GET /users/9 failed with status 404: {\"detail\":\"Not found.\"}");
/// ```
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{method} {path} failed with status {code}: {message}")]
pub struct HttpResponseError {
    /// The HTTP status code of the response.
    pub code: u16,
    /// The method of the failed request.
    pub method: HttpMethod,
    /// The route path of the failed request.
    pub path: String,
    /// Serialized response body, or the status reason when the body is empty.
    pub message: String,
    /// The parsed response body (`Null` when empty or not JSON).
    pub body: serde_json::Value,
    /// Reference ID for error reporting (from the X-Request-Id header).
    pub error_reference: Option<String>,
}

/// Error returned when an HTTP request fails validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidHttpRequestError {
    /// A POST, PUT or PATCH request was made without a body.
    #[error("Cannot use {method} without specifying data.")]
    MissingBody {
        /// The HTTP method that requires a body.
        method: String,
    },

    /// A header name or value could not be encoded.
    #[error("Invalid header '{name}'.")]
    InvalidHeader {
        /// The offending header name.
        name: String,
    },
}

/// Unified error type for all HTTP-related errors.
#[derive(Debug, Error, Clone)]
pub enum HttpError {
    /// An HTTP response error (non-2xx status code).
    #[error(transparent)]
    Response(#[from] HttpResponseError),

    /// Request validation failed.
    #[error(transparent)]
    InvalidRequest(#[from] InvalidHttpRequestError),

    /// Network or connection error.
    #[error("Network error: {0}")]
    Network(Arc<reqwest::Error>),
}

impl From<reqwest::Error> for HttpError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(Arc::new(error))
    }
}

impl HttpError {
    /// Returns the HTTP status code when the server answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Response(e) => Some(e.code),
            _ => None,
        }
    }
}
