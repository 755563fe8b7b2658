//! Validated newtype wrappers for configuration values.
//!
//! This module provides type-safe wrappers around string values that validate
//! their contents on construction. Invalid values are rejected with clear error messages.

use crate::error::ConfigError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A validated base URL for the remote API.
///
/// The URL must carry an `http` or `https` scheme and a host. A trailing
/// slash is removed so that request paths can be appended directly.
///
/// # Example
///
/// ```rust
/// use rest_resource::BaseUrl;
///
/// let url = BaseUrl::new("https://api.example.com/v1/").unwrap();
/// assert_eq!(url.as_ref(), "https://api.example.com/v1");
/// assert_eq!(url.scheme(), "https");
/// assert_eq!(url.host_name(), "api.example.com");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BaseUrl {
    url: String,
    scheme_end: usize,
    host_start: usize,
    host_end: usize,
}

impl BaseUrl {
    /// Creates a new validated base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] if the URL has no
    /// `http`/`https` scheme or no host.
    pub fn new(url: impl Into<String>) -> Result<Self, ConfigError> {
        let url = url.into();
        let url = url.trim().trim_end_matches('/').to_string();
        let invalid = || ConfigError::InvalidBaseUrl { url: url.clone() };

        let scheme_end = url.find("://").ok_or_else(invalid)?;
        let scheme = &url[..scheme_end];
        if !scheme.eq_ignore_ascii_case("http") && !scheme.eq_ignore_ascii_case("https") {
            return Err(invalid());
        }

        let host_start = scheme_end + 3;
        if host_start >= url.len() {
            return Err(invalid());
        }

        // Host ends at port, path, query, or end of string
        let remainder = &url[host_start..];
        let host_end = remainder
            .find([':', '/', '?', '#'])
            .map_or(url.len(), |i| host_start + i);

        if host_end == host_start {
            return Err(invalid());
        }

        Ok(Self {
            url,
            scheme_end,
            host_start,
            host_end,
        })
    }

    /// Returns the URL scheme (e.g., "https").
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.url[..self.scheme_end]
    }

    /// Returns the host name portion of the URL.
    #[must_use]
    pub fn host_name(&self) -> &str {
        &self.url[self.host_start..self.host_end]
    }

    /// Joins a request path onto the base URL.
    ///
    /// ```rust
    /// use rest_resource::BaseUrl;
    ///
    /// let url = BaseUrl::new("https://api.example.com").unwrap();
    /// assert_eq!(url.join("/users/1"), "https://api.example.com/users/1");
    /// assert_eq!(url.join("users"), "https://api.example.com/users");
    /// ```
    #[must_use]
    pub fn join(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.url)
        } else {
            format!("{}/{path}", self.url)
        }
    }
}

impl AsRef<str> for BaseUrl {
    fn as_ref(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// A normalized collection endpoint such as `/users`.
///
/// Endpoints always start with a single `/` and never end with one, so
/// detail routes can be built by joining `"{endpoint}/{id}"`.
///
/// # Serialization
///
/// `Endpoint` serializes to and deserializes from its normalized string:
///
/// ```rust
/// use rest_resource::Endpoint;
///
/// let endpoint = Endpoint::new("users/").unwrap();
/// let json = serde_json::to_string(&endpoint).unwrap();
/// assert_eq!(json, r#""/users""#);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Endpoint(String);

impl Endpoint {
    /// Creates a new normalized endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEndpoint`] if the endpoint is empty,
    /// only slashes, or contains whitespace, a query or a fragment.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, ConfigError> {
        let raw = endpoint.into();
        let trimmed = raw.trim().trim_matches('/');

        if trimmed.is_empty() || trimmed.contains(|c: char| c.is_whitespace() || c == '?' || c == '#')
        {
            return Err(ConfigError::InvalidEndpoint { endpoint: raw });
        }

        Ok(Self(format!("/{trimmed}")))
    }

    /// Returns the route path for a single resource below this endpoint.
    ///
    /// The id is percent-encoded so it always occupies one path segment.
    #[must_use]
    pub fn detail_path(&self, id: &str) -> String {
        format!("{}/{}", self.0, urlencoding::encode(id))
    }
}

impl AsRef<str> for Endpoint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Endpoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Endpoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(de::Error::custom)
    }
}
