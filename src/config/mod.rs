//! Configuration types for the REST resource client.
//!
//! # Overview
//!
//! The main types in this module are:
//!
//! - [`ClientConfig`]: Connection settings used to build the default transport
//! - [`ClientConfigBuilder`]: A builder for constructing [`ClientConfig`] instances
//! - [`BaseUrl`]: A validated API base URL
//! - [`Endpoint`]: A normalized collection endpoint
//!
//! # Example
//!
//! ```rust
//! use rest_resource::{BaseUrl, BearerToken, ClientConfig};
//!
//! let config = ClientConfig::builder()
//!     .base_url(BaseUrl::new("https://api.example.com").unwrap())
//!     .bearer_token(BearerToken::new("opaque-token").unwrap())
//!     .user_agent_prefix("MyApp/1.0")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.page_param(), "page");
//! ```

mod newtypes;

pub use newtypes::{BaseUrl, Endpoint};

use crate::auth::BearerToken;
use crate::error::ConfigError;
use std::collections::BTreeMap;

/// Default query parameter carrying the requested page number.
pub const DEFAULT_PAGE_PARAM: &str = "page";

/// Default query parameter carrying the requested page size.
pub const DEFAULT_PAGE_SIZE_PARAM: &str = "page_size";

/// Connection settings for a [`RestClient`](crate::RestClient).
///
/// # Thread Safety
///
/// `ClientConfig` is `Clone`, `Send`, and `Sync`.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    base_url: BaseUrl,
    bearer_token: Option<BearerToken>,
    user_agent_prefix: Option<String>,
    default_headers: BTreeMap<String, String>,
    page_param: String,
    page_size_param: String,
}

impl ClientConfig {
    /// Creates a new builder for constructing a `ClientConfig`.
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Returns the API base URL.
    #[must_use]
    pub const fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    /// Returns the bearer token, if configured.
    #[must_use]
    pub const fn bearer_token(&self) -> Option<&BearerToken> {
        self.bearer_token.as_ref()
    }

    /// Returns the user agent prefix, if configured.
    #[must_use]
    pub fn user_agent_prefix(&self) -> Option<&str> {
        self.user_agent_prefix.as_deref()
    }

    /// Returns headers sent with every request.
    #[must_use]
    pub const fn default_headers(&self) -> &BTreeMap<String, String> {
        &self.default_headers
    }

    /// Returns the query parameter name used for page numbers.
    #[must_use]
    pub fn page_param(&self) -> &str {
        &self.page_param
    }

    /// Returns the query parameter name used for page sizes.
    #[must_use]
    pub fn page_size_param(&self) -> &str {
        &self.page_size_param
    }
}

// Verify ClientConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ClientConfig>();
};

/// Builder for constructing [`ClientConfig`] instances.
///
/// `base_url` is required. All other fields have defaults.
///
/// # Defaults
///
/// - `bearer_token`: `None`
/// - `user_agent_prefix`: `None`
/// - `default_headers`: empty
/// - `page_param`: `"page"`
/// - `page_size_param`: `"page_size"`
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    base_url: Option<BaseUrl>,
    bearer_token: Option<BearerToken>,
    user_agent_prefix: Option<String>,
    default_headers: BTreeMap<String, String>,
    page_param: Option<String>,
    page_size_param: Option<String>,
}

impl ClientConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API base URL (required).
    #[must_use]
    pub fn base_url(mut self, url: BaseUrl) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Sets the bearer token sent in the `Authorization` header.
    #[must_use]
    pub fn bearer_token(mut self, token: BearerToken) -> Self {
        self.bearer_token = Some(token);
        self
    }

    /// Sets the user agent prefix for HTTP requests.
    #[must_use]
    pub fn user_agent_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.user_agent_prefix = Some(prefix.into());
        self
    }

    /// Adds a header sent with every request.
    ///
    /// Setting the same header twice keeps the last value.
    #[must_use]
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }

    /// Overrides the page number query parameter name.
    #[must_use]
    pub fn page_param(mut self, name: impl Into<String>) -> Self {
        self.page_param = Some(name.into());
        self
    }

    /// Overrides the page size query parameter name.
    #[must_use]
    pub fn page_size_param(mut self, name: impl Into<String>) -> Self {
        self.page_size_param = Some(name.into());
        self
    }

    /// Builds the [`ClientConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] if `base_url` is not set.
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        let base_url = self
            .base_url
            .ok_or(ConfigError::MissingRequiredField { field: "base_url" })?;

        Ok(ClientConfig {
            base_url,
            bearer_token: self.bearer_token,
            user_agent_prefix: self.user_agent_prefix,
            default_headers: self.default_headers,
            page_param: self
                .page_param
                .unwrap_or_else(|| DEFAULT_PAGE_PARAM.to_string()),
            page_size_param: self
                .page_size_param
                .unwrap_or_else(|| DEFAULT_PAGE_SIZE_PARAM.to_string()),
        })
    }
}
